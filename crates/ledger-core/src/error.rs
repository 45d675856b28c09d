//! Error types for the trading ledger.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::TradeOutcome;

/// Top-level ledger error.
///
/// Every variant except `Store` is a business rejection detected before any
/// state is touched. `Store` is the only system-level failure.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(i64),

    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),

    #[error("Invalid price: {0} (must be positive)")]
    InvalidPrice(Decimal),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("Trader not found: {0}")]
    TraderNotFound(String),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether this error is a business rejection with zero side effects.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Store(_))
    }

    /// Terminal outcome of a trade that failed with this error, if the
    /// failure was a business rejection.
    pub fn outcome(&self) -> Option<TradeOutcome> {
        if self.is_rejection() {
            Some(TradeOutcome::Rejected)
        } else {
            None
        }
    }
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Store is locked by another process: {0}")]
    Locked(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Quote source errors.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No quote available for {0}")]
    NoData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Account management errors.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username is already taken: {0}")]
    UsernameTaken(String),

    #[error("Email is already in use: {0}")]
    EmailTaken(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Balance cannot be negative: {0}")]
    NegativeBalance(Decimal),

    #[error("Operation requires the admin role: {0}")]
    Forbidden(String),
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
