//! Plain-text reports for the terminal.

use ledger_core::types::{Instrument, PortfolioSummary, Trader, Transaction};
use rust_decimal::Decimal;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════\n";
const THIN: &str = "───────────────────────────────────────────────────────────────────────\n";

fn header(s: &mut String, title: &str) {
    s.push_str(RULE);
    s.push_str(&format!("{:^71}\n", title));
    s.push_str(RULE);
    s.push('\n');
}

fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Portfolio summary with one line per position.
pub fn portfolio_report(trader: &Trader, summary: &PortfolioSummary) -> String {
    let mut s = String::new();
    header(&mut s, &format!("PORTFOLIO: {}", trader.username));

    s.push_str("ACCOUNT\n");
    s.push_str(THIN);
    s.push_str(&format!("  Cash Balance:        ${:.2}\n", summary.cash_balance));
    s.push_str(&format!("  Positions Value:     ${:.2}\n", summary.positions_value));
    s.push_str(&format!("  Total Value:         ${:.2}\n", summary.total_value));
    s.push_str(&format!("  Unrealized P&L:      {}\n", signed(summary.unrealized_pnl)));
    s.push_str(&format!("  Realized P&L:        {}\n", signed(summary.realized_pnl)));
    s.push('\n');

    s.push_str("POSITIONS\n");
    s.push_str(THIN);
    if summary.positions.is_empty() {
        s.push_str("  (none)\n");
    } else {
        s.push_str(&format!(
            "  {:<8}{:>8}{:>12}{:>12}{:>14}{:>14}\n",
            "Symbol", "Qty", "Avg Cost", "Price", "Value", "P&L"
        ));
        for p in &summary.positions {
            let price = p
                .current_price
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "n/a".to_string());
            s.push_str(&format!(
                "  {:<8}{:>8}{:>12.2}{:>12}{:>14.2}{:>14}\n",
                p.symbol,
                p.quantity,
                p.average_cost,
                price,
                p.market_value,
                signed(p.unrealized_pnl)
            ));
        }
    }
    s.push('\n');

    s.push_str(&format!("  As of {}\n", summary.as_of.format("%Y-%m-%d %H:%M:%S UTC")));
    s.push_str(RULE);
    s
}

/// Transaction history, in the order given.
pub fn history_report(trader: &Trader, transactions: &[Transaction]) -> String {
    let mut s = String::new();
    header(&mut s, &format!("HISTORY: {}", trader.username));

    if transactions.is_empty() {
        s.push_str("  No transactions\n");
    } else {
        s.push_str(&format!(
            "  {:<20}{:<6}{:<8}{:>8}{:>12}{:>14}\n",
            "Executed", "Side", "Symbol", "Qty", "Price", "Total"
        ));
        s.push_str(THIN);
        for t in transactions {
            s.push_str(&format!(
                "  {:<20}{:<6}{:<8}{:>8}{:>12.2}{:>14.2}\n",
                t.executed_at.format("%Y-%m-%d %H:%M:%S"),
                t.side.to_string(),
                t.symbol,
                t.quantity,
                t.price,
                t.total
            ));
        }
    }

    s.push('\n');
    s.push_str(&format!("  Transactions:        {}\n", transactions.len()));
    s.push_str(RULE);
    s
}

/// Instrument listing with day change.
pub fn instruments_report(instruments: &[Instrument]) -> String {
    let mut s = String::new();
    header(&mut s, "INSTRUMENTS");

    s.push_str(&format!(
        "  {:<7}{:<26}{:>11}{:>11}{:>10}  {}\n",
        "Symbol", "Name", "Price", "Change", "Change%", "Sector"
    ));
    s.push_str(THIN);
    for i in instruments {
        let change = i.change_amount().map(signed).unwrap_or_else(|| "-".to_string());
        let percent = i
            .change_percent()
            .map(|p| format!("{}%", signed(p)))
            .unwrap_or_else(|| "-".to_string());
        s.push_str(&format!(
            "  {:<7}{:<26}{:>11.2}{:>11}{:>10}  {}\n",
            i.symbol,
            i.name,
            i.current_price(),
            change,
            percent,
            i.sector
        ));
    }
    s.push_str(RULE);
    s
}

/// Registered traders and balances.
pub fn traders_report(traders: &[Trader]) -> String {
    let mut s = String::new();
    header(&mut s, "TRADERS");

    s.push_str(&format!(
        "  {:<38}{:<16}{:>14}  {}\n",
        "Id", "Username", "Balance", "Roles"
    ));
    s.push_str(THIN);
    for t in traders {
        let roles: Vec<&str> = t.roles.iter().map(|r| r.authority()).collect();
        s.push_str(&format!(
            "  {:<38}{:<16}{:>14.2}  {}\n",
            t.id.to_string(),
            t.username,
            t.balance,
            roles.join(",")
        ));
    }
    s.push_str(RULE);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::types::{PositionSet, PriceSnapshot};
    use rust_decimal_macros::dec;

    fn alice() -> Trader {
        Trader::new("alice", "alice@example.com", "Alice", "Liddell", dec!(8500))
    }

    #[test]
    fn test_portfolio_report() {
        let trader = alice();
        let mut positions = PositionSet::new(trader.id);
        positions.increase("AAPL", 10, dec!(150)).unwrap();
        positions.increase("TSLA", 1, dec!(800)).unwrap();
        let mut prices = PriceSnapshot::new();
        prices.insert("AAPL".to_string(), dec!(170));

        let summary = PortfolioSummary::build(&positions, &prices, trader.balance, dec!(0));
        let report = portfolio_report(&trader, &summary);

        assert!(report.contains("PORTFOLIO: alice"));
        assert!(report.contains("$8500.00"));
        assert!(report.contains("+200.00"));
        assert!(report.contains("n/a"));
    }

    #[test]
    fn test_empty_history() {
        let report = history_report(&alice(), &[]);
        assert!(report.contains("No transactions"));
        assert!(report.contains("Transactions:        0"));
    }

    #[test]
    fn test_history_report() {
        let trader = alice();
        let tx = Transaction::buy(trader.id, "AAPL", "Apple Inc.", 10, dec!(150));
        let report = history_report(&trader, &[tx]);
        assert!(report.contains("BUY"));
        assert!(report.contains("1500.00"));
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(dec!(2.5)), "+2.50");
        assert_eq!(signed(dec!(-1)), "-1.00");
        assert_eq!(signed(Decimal::ZERO), "0.00");
    }
}
