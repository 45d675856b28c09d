//! Per-trader exclusive access.

use dashmap::DashMap;
use ledger_core::types::TraderId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per trader.
///
/// Operations on the same trader are serialized; different traders never
/// contend on a shared lock.
#[derive(Clone, Default)]
pub struct TraderLocks {
    locks: Arc<DashMap<TraderId, Arc<Mutex<()>>>>,
}

impl TraderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a trader's aggregate state.
    pub async fn acquire(&self, trader_id: &TraderId) -> OwnedMutexGuard<()> {
        // Clone out of the map so no shard lock is held while waiting
        let lock = self.locks.entry(*trader_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry of a removed trader.
    pub fn forget(&self, trader_id: &TraderId) {
        self.locks.remove(trader_id);
    }

    /// Number of traders with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
