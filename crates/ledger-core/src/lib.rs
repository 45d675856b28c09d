//! Core types and traits for the trading ledger.
//!
//! This crate provides the foundational building blocks including:
//! - Trader accounts, positions and transaction records
//! - Instruments and quotes
//! - Collaborator traits for stores and market data
//! - The ledger error taxonomy

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AccountError, LedgerError, LedgerResult, QuoteError, StoreError};
pub use traits::*;
pub use types::*;
