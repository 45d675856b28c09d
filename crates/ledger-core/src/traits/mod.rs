//! Collaborator traits for the trading ledger.

mod market;
mod store;

pub use market::{InstrumentSource, QuoteSource};
pub use store::{AccountStore, LedgerHistory, PositionStore, TradeCommit, TradeStore};
