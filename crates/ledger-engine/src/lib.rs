//! Trade execution and account management.
//!
//! The [`TradingEngine`] executes buys and sells against a
//! [`TradeStore`](ledger_core::traits::TradeStore), holding a per-trader lock
//! for the duration of each trade. [`AccountService`] shares that lock
//! registry for balance overrides and deletions.

mod accounts;
mod engine;
mod locks;

pub use accounts::{AccountPolicy, AccountService, NewTrader};
pub use engine::TradingEngine;
pub use locks::TraderLocks;
