//! Portfolio valuation summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Position, PositionSet, PriceSnapshot, TraderId};

/// One position valued at a snapshot price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub symbol: String,
    pub quantity: u64,
    pub average_cost: Decimal,
    /// None when the snapshot had no price for the symbol
    pub current_price: Option<Decimal>,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    /// Zero when unpriced
    pub unrealized_pnl: Decimal,
}

impl PositionView {
    fn new(position: &Position, price: Option<Decimal>) -> Self {
        let cost_basis = position.cost_basis();
        let (market_value, unrealized_pnl) = match price {
            Some(p) => {
                let value = position.market_value(p);
                (value, value - cost_basis)
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            average_cost: position.average_cost,
            current_price: price,
            market_value,
            cost_basis,
            unrealized_pnl,
        }
    }
}

/// Cash plus positions, valued against one price snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub trader_id: TraderId,
    pub positions: Vec<PositionView>,
    pub positions_value: Decimal,
    pub cash_balance: Decimal,
    /// `positions_value + cash_balance`
    pub total_value: Decimal,
    pub unrealized_pnl: Decimal,
    /// Sum of realized P&L over the trader's sells
    pub realized_pnl: Decimal,
    pub as_of: DateTime<Utc>,
}

impl PortfolioSummary {
    /// Build a summary from one consistent read of positions, balance and prices.
    pub fn build(
        positions: &PositionSet,
        prices: &PriceSnapshot,
        cash_balance: Decimal,
        realized_pnl: Decimal,
    ) -> Self {
        let views: Vec<PositionView> = positions
            .iter()
            .map(|p| PositionView::new(p, prices.get(&p.symbol).copied()))
            .collect();

        let positions_value = positions.valuate(prices);
        let unrealized_pnl = views.iter().map(|v| v.unrealized_pnl).sum();

        Self {
            trader_id: positions.trader_id,
            positions: views,
            positions_value,
            cash_balance,
            total_value: positions_value + cash_balance,
            unrealized_pnl,
            realized_pnl,
            as_of: Utc::now(),
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&PositionView> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }
}
