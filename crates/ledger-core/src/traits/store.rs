//! Storage collaborator traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::types::{PositionSet, Trader, TraderId, Transaction};

/// Durable storage for trader identity and balance.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load a trader by id.
    async fn load_trader(&self, id: &TraderId) -> Result<Option<Trader>, StoreError>;

    /// Load a trader by unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Trader>, StoreError>;

    /// Load a trader by unique email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Trader>, StoreError>;

    /// All traders, ordered by username.
    async fn list_traders(&self) -> Result<Vec<Trader>, StoreError>;

    /// Insert or replace a trader record.
    ///
    /// Fails with `InvariantViolation` for a negative balance and with
    /// `Duplicate` when another trader holds the username or email.
    async fn save_trader(&self, trader: &Trader) -> Result<(), StoreError>;
}

/// Durable storage for per-trader holdings.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Load a trader's positions. A trader without positions gets an empty set.
    async fn load_positions(&self, id: &TraderId) -> Result<PositionSet, StoreError>;

    /// Replace a trader's positions.
    async fn save_positions(&self, positions: &PositionSet) -> Result<(), StoreError>;
}

/// Append-only storage for executed transactions.
#[async_trait]
pub trait LedgerHistory: Send + Sync {
    /// Append a transaction record.
    async fn append(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// A trader's transactions, newest first.
    async fn list_by_trader(&self, id: &TraderId) -> Result<Vec<Transaction>, StoreError>;
}

/// The three state changes of one executed trade.
#[derive(Debug, Clone)]
pub struct TradeCommit {
    pub trader: Trader,
    pub positions: PositionSet,
    pub transaction: Transaction,
}

impl TradeCommit {
    /// Check that the commit is internally consistent and leaves the trader
    /// solvent.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.trader.balance < Decimal::ZERO {
            return Err(StoreError::InvariantViolation(format!(
                "balance of {} would be negative: {}",
                self.trader.username, self.trader.balance
            )));
        }
        let id = self.trader.id;
        if self.positions.trader_id != id || self.transaction.trader_id != id {
            return Err(StoreError::InvariantViolation(format!(
                "commit for trader {} mixes state of another trader",
                self.trader.id
            )));
        }
        if self.transaction.quantity == 0 {
            return Err(StoreError::InvariantViolation(
                "transaction quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A store spanning balance, positions and history with one atomic
/// commit boundary.
#[async_trait]
pub trait TradeStore: AccountStore + PositionStore + LedgerHistory {
    /// Apply the balance, position and history changes of one trade.
    ///
    /// Either all three are applied or none is.
    async fn commit(&self, commit: TradeCommit) -> Result<(), StoreError>;

    /// Remove a trader together with their positions and history.
    ///
    /// Returns false if the trader did not exist.
    async fn remove_trader(&self, id: &TraderId) -> Result<bool, StoreError>;
}
