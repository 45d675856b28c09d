//! Buy and sell commands.

use anyhow::{bail, Result};
use ledger_core::types::{Side, TradeRequest};

use crate::cli::context::Ledger;
use crate::cli::TradeArgs;

pub async fn run(side: Side, args: TradeArgs, ledger: &Ledger) -> Result<()> {
    let trader = ledger.trader(&args.trader).await?;
    let symbol = args.symbol.trim().to_uppercase();
    let request = match side {
        Side::Buy => TradeRequest::buy(symbol, args.quantity),
        Side::Sell => TradeRequest::sell(symbol, args.quantity),
    };

    match ledger.engine.execute(&trader.id, &request).await {
        Ok(tx) => {
            let balance = ledger.accounts.get(&trader.id).await?.balance;
            println!(
                "{} {} {} @ ${:.2} = ${:.2}",
                tx.side, tx.quantity, tx.symbol, tx.price, tx.total
            );
            if let Some(pnl) = tx.realized_pnl {
                println!("  Realized P&L:  ${:.2}", pnl);
            }
            println!("  Cash balance:  ${:.2}", balance);
            Ok(())
        }
        Err(e) if e.is_rejection() => bail!("Order rejected: {}", e),
        Err(e) => Err(anyhow::Error::new(e).context("Order failed")),
    }
}
