//! Trade requests and executed transaction records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::TraderId;

/// Trade side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Terminal outcome of a trade request.
///
/// There is no pending state: a request is either fully executed or
/// rejected with no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Executed,
    Rejected,
}

/// A caller's request to buy or sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: Side,
    /// Requested quantity; validated by the engine
    pub quantity: i64,
}

impl TradeRequest {
    pub fn buy(symbol: impl Into<String>, quantity: i64) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Buy,
            quantity,
        }
    }

    pub fn sell(symbol: impl Into<String>, quantity: i64) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Sell,
            quantity,
        }
    }
}

/// Immutable record of one executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub trader_id: TraderId,
    pub symbol: String,
    pub instrument_name: String,
    pub side: Side,
    pub quantity: u64,
    /// Price per share at execution
    pub price: Decimal,
    /// `price * quantity`
    pub total: Decimal,
    /// `(price - average cost) * quantity`, sells only
    pub realized_pnl: Option<Decimal>,
    pub executed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Transaction {
    /// Record a buy at `price`.
    pub fn buy(
        trader_id: TraderId,
        symbol: impl Into<String>,
        instrument_name: impl Into<String>,
        quantity: u64,
        price: Decimal,
    ) -> Self {
        Self::record(trader_id, symbol, instrument_name, Side::Buy, quantity, price)
            .with_notes("Buy order executed successfully")
    }

    /// Record a sell at `price` against the position's average cost.
    pub fn sell(
        trader_id: TraderId,
        symbol: impl Into<String>,
        instrument_name: impl Into<String>,
        quantity: u64,
        price: Decimal,
        average_cost: Decimal,
    ) -> Self {
        let mut tx = Self::record(trader_id, symbol, instrument_name, Side::Sell, quantity, price)
            .with_notes("Sell order executed successfully");
        tx.realized_pnl = Some((price - average_cost) * Decimal::from(quantity));
        tx
    }

    fn record(
        trader_id: TraderId,
        symbol: impl Into<String>,
        instrument_name: impl Into<String>,
        side: Side,
        quantity: u64,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trader_id,
            symbol: symbol.into(),
            instrument_name: instrument_name.into(),
            side,
            quantity,
            price,
            total: price * Decimal::from(quantity),
            realized_pnl: None,
            executed_at: Utc::now(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_record() {
        let tx = Transaction::buy(TraderId::new(), "AAPL", "Apple Inc.", 10, dec!(150));
        assert_eq!(tx.side, Side::Buy);
        assert_eq!(tx.total, dec!(1500));
        assert_eq!(tx.realized_pnl, None);
        assert_eq!(tx.notes.as_deref(), Some("Buy order executed successfully"));
    }

    #[test]
    fn test_sell_record_realizes_pnl() {
        let trader = TraderId::new();
        let tx = Transaction::sell(trader, "AAPL", "Apple Inc.", 15, dec!(170), dec!(153.33));
        assert_eq!(tx.total, dec!(2550));
        assert_eq!(tx.realized_pnl, Some(dec!(250.05)));
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(TradeRequest::sell("AAPL", 3).side, Side::Sell);
    }
}
