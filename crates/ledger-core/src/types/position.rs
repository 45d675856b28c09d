//! Positions and the per-trader position set.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::TraderId;
use crate::error::LedgerError;

/// Decimal places kept for average cost.
pub const AVERAGE_COST_SCALE: u32 = 2;

/// Symbol to current price, captured once per read.
pub type PriceSnapshot = HashMap<String, Decimal>;

/// Round half-up to `dp` places.
///
/// All ledger amounts are positive, so midpoint-away-from-zero is half-up.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// A trader's holding in one instrument.
///
/// Quantity and average cost live on the same entity so they can never be
/// updated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub trader_id: TraderId,
    pub symbol: String,
    /// Shares held, always positive while the position exists
    pub quantity: u64,
    /// Weighted-average purchase price
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    fn open(trader_id: TraderId, symbol: &str, quantity: u64, price: Decimal) -> Self {
        Self {
            trader_id,
            symbol: symbol.to_string(),
            quantity,
            average_cost: price,
            updated_at: Utc::now(),
        }
    }

    /// Quantity times average cost.
    pub fn cost_basis(&self) -> Decimal {
        Decimal::from(self.quantity) * self.average_cost
    }

    /// Quantity times the given price.
    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.quantity) * price
    }
}

/// Effect of a single increase or decrease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionChange {
    pub quantity_before: u64,
    pub quantity_after: u64,
    /// Average cost after an increase, or the (unchanged) cost basis price
    /// the shares were sold against after a decrease.
    pub average_cost: Decimal,
}

impl PositionChange {
    /// Whether the change left the position flat.
    pub fn closed(&self) -> bool {
        self.quantity_after == 0
    }
}

/// All open positions of one trader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSet {
    pub trader_id: TraderId,
    positions: BTreeMap<String, Position>,
}

impl PositionSet {
    /// Create an empty position set.
    pub fn new(trader_id: TraderId) -> Self {
        Self {
            trader_id,
            positions: BTreeMap::new(),
        }
    }

    /// Get the position for a symbol, if one is open.
    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Shares held of `symbol`, 0 if flat.
    pub fn quantity(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map(|p| p.quantity).unwrap_or(0)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Open positions ordered by symbol.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    /// Add shares bought at `price`.
    ///
    /// The new average cost is `(a0*q0 + price*quantity) / (q0 + quantity)`
    /// rounded to two places half-up; a fresh position takes `price` as is.
    pub fn increase(
        &mut self,
        symbol: &str,
        quantity: u64,
        price: Decimal,
    ) -> Result<PositionChange, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(0));
        }
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(price));
        }

        match self.positions.get_mut(symbol) {
            Some(position) => {
                let before = position.quantity;
                let after = before + quantity;
                let total_cost = position.average_cost * Decimal::from(before)
                    + price * Decimal::from(quantity);

                position.average_cost =
                    round_half_up(total_cost / Decimal::from(after), AVERAGE_COST_SCALE);
                position.quantity = after;
                position.updated_at = Utc::now();

                Ok(PositionChange {
                    quantity_before: before,
                    quantity_after: after,
                    average_cost: position.average_cost,
                })
            }
            None => {
                self.positions.insert(
                    symbol.to_string(),
                    Position::open(self.trader_id, symbol, quantity, price),
                );
                Ok(PositionChange {
                    quantity_before: 0,
                    quantity_after: quantity,
                    average_cost: price,
                })
            }
        }
    }

    /// Remove shares sold.
    ///
    /// Average cost is unaffected by a partial sell. A position that reaches
    /// zero is removed entirely.
    pub fn decrease(&mut self, symbol: &str, quantity: u64) -> Result<PositionChange, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity(0));
        }

        let held = self.quantity(symbol);
        let position = match self.positions.get_mut(symbol) {
            Some(position) if held >= quantity => position,
            _ => {
                return Err(LedgerError::InsufficientShares {
                    symbol: symbol.to_string(),
                    requested: quantity,
                    held,
                })
            }
        };

        let average_cost = position.average_cost;
        let after = held - quantity;

        if after == 0 {
            self.positions.remove(symbol);
        } else {
            position.quantity = after;
            position.updated_at = Utc::now();
        }

        Ok(PositionChange {
            quantity_before: held,
            quantity_after: after,
            average_cost,
        })
    }

    /// Sum of `quantity * price` over held symbols.
    ///
    /// A symbol missing from `prices` contributes 0.
    pub fn valuate(&self, prices: &PriceSnapshot) -> Decimal {
        self.positions
            .values()
            .map(|p| {
                prices
                    .get(&p.symbol)
                    .map(|price| p.market_value(*price))
                    .unwrap_or(Decimal::ZERO)
            })
            .sum()
    }

    /// Symbols held that have no price in `prices`.
    pub fn unpriced(&self, prices: &PriceSnapshot) -> Vec<String> {
        self.positions
            .keys()
            .filter(|symbol| !prices.contains_key(*symbol))
            .cloned()
            .collect()
    }
}
