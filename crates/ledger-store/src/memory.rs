//! In-memory trade store with optional snapshot durability.

use async_trait::async_trait;
use ledger_core::error::StoreError;
use ledger_core::traits::{AccountStore, LedgerHistory, PositionStore, TradeCommit, TradeStore};
use ledger_core::types::{PositionSet, Trader, TraderId, Transaction};
use fs2::FileExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const SNAPSHOT_VERSION: u32 = 1;

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
struct LedgerState {
    traders: BTreeMap<TraderId, Trader>,
    positions: BTreeMap<TraderId, PositionSet>,
    /// Insertion order is execution order
    history: Vec<Transaction>,
}

impl LedgerState {
    fn check_unique(&self, trader: &Trader) -> Result<(), StoreError> {
        let clash = self.traders.values().find(|t| {
            t.id != trader.id && (t.username == trader.username || t.email == trader.email)
        });
        match clash {
            Some(other) if other.username == trader.username => Err(StoreError::Duplicate {
                field: "username",
                value: trader.username.clone(),
            }),
            Some(_) => Err(StoreError::Duplicate {
                field: "email",
                value: trader.email.clone(),
            }),
            None => Ok(()),
        }
    }

    fn put_positions(&mut self, positions: PositionSet) {
        if positions.is_empty() {
            self.positions.remove(&positions.trader_id);
        } else {
            self.positions.insert(positions.trader_id, positions);
        }
    }
}

/// On-disk representation.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    traders: Vec<Trader>,
    positions: Vec<PositionSet>,
    history: Vec<Transaction>,
}

impl From<&LedgerState> for Snapshot {
    fn from(state: &LedgerState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            traders: state.traders.values().cloned().collect(),
            positions: state.positions.values().cloned().collect(),
            history: state.history.clone(),
        }
    }
}

impl From<Snapshot> for LedgerState {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            traders: snapshot.traders.into_iter().map(|t| (t.id, t)).collect(),
            positions: snapshot.positions.into_iter().map(|p| (p.trader_id, p)).collect(),
            history: snapshot.history,
        }
    }
}

/// Trade store keeping all state behind one mutex.
///
/// Every write is applied to a copy of the state, persisted if a snapshot
/// path is set, and only then swapped in. A failed write leaves the
/// previous state in place.
///
/// A durable store holds an exclusive lock on `<snapshot>.lock` for its
/// whole lifetime, so at most one process owns a snapshot at a time.
pub struct MemoryStore {
    state: Mutex<LedgerState>,
    snapshot_path: Option<PathBuf>,
    _lock: Option<File>,
}

impl MemoryStore {
    /// Create a volatile store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            snapshot_path: None,
            _lock: None,
        }
    }

    /// Create a store persisted to `path`, loading it if it exists.
    ///
    /// Fails with `StoreError::Locked` if another store has it open.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let lock = acquire_lock(&path)?;

        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&raw)?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(StoreError::Serialization(format!(
                    "unsupported snapshot version {}",
                    snapshot.version
                )));
            }
            info!(
                path = %path.display(),
                traders = snapshot.traders.len(),
                "Loaded ledger snapshot"
            );
            LedgerState::from(snapshot)
        } else {
            debug!(path = %path.display(), "No snapshot yet, starting empty");
            LedgerState::default()
        };

        Ok(Self {
            state: Mutex::new(state),
            snapshot_path: Some(path),
            _lock: Some(lock),
        })
    }

    /// Apply `f` to a copy of the state and swap it in once persisted.
    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut LedgerState) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let result = f(&mut next)?;

        if let Some(path) = &self.snapshot_path {
            let json = serde_json::to_vec_pretty(&Snapshot::from(&next))?;
            let path = path.clone();
            let written = tokio::task::spawn_blocking(move || write_snapshot(&path, &json))
                .await
                .map_err(|e| StoreError::Backend(format!("snapshot writer panicked: {}", e)))
                .and_then(|r| r);

            if let Err(e) = written {
                error!(error = %e, "Failed to persist ledger snapshot, rolling back");
                return Err(e);
            }
        }

        *state = next;
        Ok(result)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn acquire_lock(snapshot: &Path) -> Result<File, StoreError> {
    let lock_path = snapshot.with_extension("lock");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(StoreError::Locked(snapshot.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write `json` next to `path`, flush it to disk, then rename over `path`.
fn write_snapshot(path: &Path, json: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(json)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn load_trader(&self, id: &TraderId) -> Result<Option<Trader>, StoreError> {
        Ok(self.state.lock().await.traders.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Trader>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.traders.values().find(|t| t.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Trader>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.traders.values().find(|t| t.email == email).cloned())
    }

    async fn list_traders(&self) -> Result<Vec<Trader>, StoreError> {
        let state = self.state.lock().await;
        let mut traders: Vec<Trader> = state.traders.values().cloned().collect();
        traders.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(traders)
    }

    async fn save_trader(&self, trader: &Trader) -> Result<(), StoreError> {
        if trader.balance < Decimal::ZERO {
            return Err(StoreError::InvariantViolation(format!(
                "balance of {} would be negative: {}",
                trader.username, trader.balance
            )));
        }

        self.mutate(|state| {
            state.check_unique(trader)?;
            state.traders.insert(trader.id, trader.clone());
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn load_positions(&self, id: &TraderId) -> Result<PositionSet, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .positions
            .get(id)
            .cloned()
            .unwrap_or_else(|| PositionSet::new(*id)))
    }

    async fn save_positions(&self, positions: &PositionSet) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.put_positions(positions.clone());
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LedgerHistory for MemoryStore {
    async fn append(&self, transaction: &Transaction) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.history.push(transaction.clone());
            Ok(())
        })
        .await
    }

    async fn list_by_trader(&self, id: &TraderId) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.lock().await;
        let mut transactions: Vec<Transaction> = state
            .history
            .iter()
            .rev()
            .filter(|t| t.trader_id == *id)
            .cloned()
            .collect();
        // Stable sort keeps reverse insertion order for equal timestamps
        transactions.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        Ok(transactions)
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn commit(&self, commit: TradeCommit) -> Result<(), StoreError> {
        commit.check()?;

        self.mutate(|state| {
            if !state.traders.contains_key(&commit.trader.id) {
                return Err(StoreError::Conflict(format!(
                    "trader {} no longer exists",
                    commit.trader.id
                )));
            }

            let TradeCommit { trader, positions, transaction } = commit;
            state.traders.insert(trader.id, trader);
            state.put_positions(positions);
            state.history.push(transaction);
            Ok(())
        })
        .await
    }

    async fn remove_trader(&self, id: &TraderId) -> Result<bool, StoreError> {
        self.mutate(|state| {
            if state.traders.remove(id).is_none() {
                return Ok(false);
            }
            state.positions.remove(id);
            state.history.retain(|t| t.trader_id != *id);
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn history_len(store: &MemoryStore) -> usize {
        store.state.lock().await.history.len()
    }

    fn trader(name: &str, balance: Decimal) -> Trader {
        Trader::new(name, format!("{}@example.com", name), name, "Test", balance)
    }

    fn buy_commit(trader: &Trader, symbol: &str, quantity: u64, price: Decimal) -> TradeCommit {
        let mut positions = PositionSet::new(trader.id);
        positions.increase(symbol, quantity, price).unwrap();
        let cost = price * Decimal::from(quantity);
        TradeCommit {
            trader: trader.debited(cost).unwrap(),
            positions,
            transaction: Transaction::buy(trader.id, symbol, symbol, quantity, price),
        }
    }

    #[tokio::test]
    async fn test_commit_applies_all_three() {
        let store = MemoryStore::new();
        let alice = trader("alice", dec!(10000));
        store.save_trader(&alice).await.unwrap();

        store.commit(buy_commit(&alice, "AAPL", 10, dec!(150))).await.unwrap();

        let loaded = store.load_trader(&alice.id).await.unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(8500));
        assert_eq!(store.load_positions(&alice.id).await.unwrap().quantity("AAPL"), 10);
        assert_eq!(store.list_by_trader(&alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_commit_changes_nothing() {
        let store = MemoryStore::new();
        let alice = trader("alice", dec!(10000));
        store.save_trader(&alice).await.unwrap();

        let mut commit = buy_commit(&alice, "AAPL", 10, dec!(150));
        commit.trader.balance = dec!(-1);

        let err = store.commit(commit).await.unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
        assert_eq!(store.load_trader(&alice.id).await.unwrap().unwrap().balance, dec!(10000));
        assert!(store.load_positions(&alice.id).await.unwrap().is_empty());
        assert_eq!(history_len(&store).await, 0);
    }

    #[tokio::test]
    async fn test_commit_for_unknown_trader_is_conflict() {
        let store = MemoryStore::new();
        let ghost = trader("ghost", dec!(1000));

        let err = store.commit(buy_commit(&ghost, "AAPL", 1, dec!(150))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(history_len(&store).await, 0);
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let store = MemoryStore::new();
        store.save_trader(&trader("alice", dec!(1))).await.unwrap();

        let err = store.save_trader(&trader("alice", dec!(1))).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "username", .. }));

        let mut other = trader("bob", dec!(1));
        other.email = "alice@example.com".to_string();
        let err = store.save_trader(&other).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let store = MemoryStore::new();
        let alice = trader("alice", dec!(10000));
        store.save_trader(&alice).await.unwrap();

        let first = Transaction::buy(alice.id, "AAPL", "Apple Inc.", 1, dec!(150));
        let mut second = Transaction::buy(alice.id, "MSFT", "Microsoft Corporation", 1, dec!(300));
        second.executed_at = first.executed_at + chrono::Duration::seconds(1);

        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();
        store.append(&Transaction::buy(TraderId::new(), "AMD", "AMD", 1, dec!(100))).await.unwrap();

        let history = store.list_by_trader(&alice.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].symbol, "MSFT");
        assert_eq!(history[1].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_remove_trader_cascades() {
        let store = MemoryStore::new();
        let alice = trader("alice", dec!(10000));
        store.save_trader(&alice).await.unwrap();
        store.commit(buy_commit(&alice, "AAPL", 10, dec!(150))).await.unwrap();

        assert!(store.remove_trader(&alice.id).await.unwrap());
        assert!(store.load_trader(&alice.id).await.unwrap().is_none());
        assert!(store.load_positions(&alice.id).await.unwrap().is_empty());
        assert!(store.list_by_trader(&alice.id).await.unwrap().is_empty());
        assert!(!store.remove_trader(&alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let alice = trader("alice", dec!(10000));
        {
            let store = MemoryStore::open(&path).unwrap();
            store.save_trader(&alice).await.unwrap();
            store.commit(buy_commit(&alice, "AAPL", 10, dec!(150))).await.unwrap();
        }

        let reopened = MemoryStore::open(&path).unwrap();
        let loaded = reopened.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(8500));
        let positions = reopened.load_positions(&alice.id).await.unwrap();
        assert_eq!(positions.get("AAPL").unwrap().average_cost, dec!(150));
        assert_eq!(history_len(&reopened).await, 1);
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let store = MemoryStore::open(&path).unwrap();

        let alice = trader("alice", dec!(10000));
        store.save_trader(&alice).await.unwrap();

        // A directory where the temp file should go makes the write fail
        fs::create_dir(path.with_extension("tmp")).unwrap();

        let err = store.commit(buy_commit(&alice, "AAPL", 10, dec!(150))).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.load_trader(&alice.id).await.unwrap().unwrap().balance, dec!(10000));
        assert!(store.load_positions(&alice.id).await.unwrap().is_empty());
        assert_eq!(history_len(&store).await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_owned_by_one_store_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let alice = trader("alice", dec!(10000));

        let first = MemoryStore::open(&path).unwrap();
        first.save_trader(&alice).await.unwrap();
        first.commit(buy_commit(&alice, "AAPL", 10, dec!(150))).await.unwrap();

        let err = MemoryStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Locked(_)));

        drop(first);
        let second = MemoryStore::open(&path).unwrap();
        assert_eq!(second.load_positions(&alice.id).await.unwrap().quantity("AAPL"), 10);
        assert_eq!(history_len(&second).await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let store = MemoryStore::open(&path).unwrap();
        store.save_trader(&trader("alice", dec!(10000))).await.unwrap();

        assert!(!path.with_extension("tmp").exists());
        let raw = fs::read_to_string(&path).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.traders.len(), 1);
    }
}
