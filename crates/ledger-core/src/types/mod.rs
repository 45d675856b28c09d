//! Core data types for the trading ledger.

mod instrument;
mod position;
mod summary;
mod trader;
mod transaction;

pub use instrument::{Instrument, Quote, CHANGE_PERCENT_SCALE};
pub use position::{
    round_half_up, Position, PositionChange, PositionSet, PriceSnapshot, AVERAGE_COST_SCALE,
};
pub use summary::{PortfolioSummary, PositionView};
pub use trader::{Role, Trader, TraderId};
pub use transaction::{Side, TradeOutcome, TradeRequest, Transaction};
