//! Trading ledger engine.

use ledger_core::error::{LedgerError, LedgerResult};
use ledger_core::traits::{InstrumentSource, TradeCommit, TradeStore};
use ledger_core::types::{
    Instrument, PortfolioSummary, Side, TradeRequest, Trader, TraderId, Transaction,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::locks::TraderLocks;

/// Executes buys and sells as single atomic commits against a trade store.
///
/// Each trade resolves its price once, then validates and mutates the
/// trader's state under that trader's lock.
pub struct TradingEngine<S> {
    store: Arc<S>,
    market: Arc<dyn InstrumentSource>,
    locks: TraderLocks,
}

impl<S: TradeStore> TradingEngine<S> {
    /// Create a new engine.
    pub fn new(store: Arc<S>, market: Arc<dyn InstrumentSource>) -> Self {
        Self {
            store,
            market,
            locks: TraderLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Lock registry, to be shared with other writers of trader state.
    pub fn locks(&self) -> &TraderLocks {
        &self.locks
    }

    /// Execute a trade request.
    pub async fn execute(
        &self,
        trader_id: &TraderId,
        request: &TradeRequest,
    ) -> LedgerResult<Transaction> {
        match request.side {
            Side::Buy => self.execute_buy(trader_id, &request.symbol, request.quantity).await,
            Side::Sell => self.execute_sell(trader_id, &request.symbol, request.quantity).await,
        }
    }

    /// Buy `quantity` shares of `symbol` at the current price.
    pub async fn execute_buy(
        &self,
        trader_id: &TraderId,
        symbol: &str,
        quantity: i64,
    ) -> LedgerResult<Transaction> {
        let result = self.buy(trader_id, symbol, quantity).await;
        log_outcome(Side::Buy, trader_id, symbol, quantity, &result);
        result
    }

    /// Sell `quantity` shares of `symbol` at the current price.
    pub async fn execute_sell(
        &self,
        trader_id: &TraderId,
        symbol: &str,
        quantity: i64,
    ) -> LedgerResult<Transaction> {
        let result = self.sell(trader_id, symbol, quantity).await;
        log_outcome(Side::Sell, trader_id, symbol, quantity, &result);
        result
    }

    async fn buy(
        &self,
        trader_id: &TraderId,
        symbol: &str,
        quantity: i64,
    ) -> LedgerResult<Transaction> {
        let quantity = validate_quantity(quantity)?;
        let instrument = self.resolve(symbol).await?;
        let price = execution_price(&instrument)?;
        let cost = price * Decimal::from(quantity);

        let _guard = self.locks.acquire(trader_id).await;
        let trader = self.load_trader(trader_id).await?;

        if !trader.can_afford(cost) {
            return Err(LedgerError::InsufficientFunds {
                required: cost,
                available: trader.balance,
            });
        }

        let mut positions = self.store.load_positions(trader_id).await?;
        positions.increase(&instrument.symbol, quantity, price)?;

        let debited = trader.debited(cost).ok_or(LedgerError::InsufficientFunds {
            required: cost,
            available: trader.balance,
        })?;
        let transaction = Transaction::buy(
            trader.id,
            &instrument.symbol,
            &instrument.name,
            quantity,
            price,
        );

        self.store
            .commit(TradeCommit {
                trader: debited,
                positions,
                transaction: transaction.clone(),
            })
            .await?;

        Ok(transaction)
    }

    async fn sell(
        &self,
        trader_id: &TraderId,
        symbol: &str,
        quantity: i64,
    ) -> LedgerResult<Transaction> {
        let quantity = validate_quantity(quantity)?;
        let instrument = self.resolve(symbol).await?;

        let _guard = self.locks.acquire(trader_id).await;
        let trader = self.load_trader(trader_id).await?;
        let mut positions = self.store.load_positions(trader_id).await?;

        let held = positions.quantity(&instrument.symbol);
        if held < quantity {
            return Err(LedgerError::InsufficientShares {
                symbol: instrument.symbol.clone(),
                requested: quantity,
                held,
            });
        }

        let price = execution_price(&instrument)?;
        let proceeds = price * Decimal::from(quantity);

        let change = positions.decrease(&instrument.symbol, quantity)?;
        let credited = trader.credited(proceeds);
        let transaction = Transaction::sell(
            trader.id,
            &instrument.symbol,
            &instrument.name,
            quantity,
            price,
            change.average_cost,
        );

        self.store
            .commit(TradeCommit {
                trader: credited,
                positions,
                transaction: transaction.clone(),
            })
            .await?;

        Ok(transaction)
    }

    /// Value a trader's positions and cash against one price snapshot.
    pub async fn portfolio_summary(&self, trader_id: &TraderId) -> LedgerResult<PortfolioSummary> {
        let (trader, positions, history) = {
            let _guard = self.locks.acquire(trader_id).await;
            let trader = self.load_trader(trader_id).await?;
            let positions = self.store.load_positions(trader_id).await?;
            let history = self.store.list_by_trader(trader_id).await?;
            (trader, positions, history)
        };

        let prices = self.market.price_snapshot(&positions.symbols()).await?;
        let unpriced = positions.unpriced(&prices);
        if !unpriced.is_empty() {
            warn!(
                trader = %trader_id,
                symbols = ?unpriced,
                "Positions without a price are valued at 0"
            );
        }

        let realized: Decimal = history.iter().filter_map(|t| t.realized_pnl).sum();
        let summary = PortfolioSummary::build(&positions, &prices, trader.balance, realized);

        debug!(
            trader = %trader_id,
            positions = summary.positions.len(),
            total_value = %summary.total_value,
            "Built portfolio summary"
        );
        Ok(summary)
    }

    /// A trader's executed transactions, newest first.
    pub async fn history(&self, trader_id: &TraderId) -> LedgerResult<Vec<Transaction>> {
        self.load_trader(trader_id).await?;
        Ok(self.store.list_by_trader(trader_id).await?)
    }

    async fn resolve(&self, symbol: &str) -> LedgerResult<Instrument> {
        self.market
            .instrument(symbol)
            .await?
            .ok_or_else(|| LedgerError::InstrumentNotFound(symbol.to_string()))
    }

    async fn load_trader(&self, trader_id: &TraderId) -> LedgerResult<Trader> {
        self.store
            .load_trader(trader_id)
            .await?
            .ok_or_else(|| LedgerError::TraderNotFound(trader_id.to_string()))
    }
}

fn validate_quantity(quantity: i64) -> LedgerResult<u64> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(quantity as u64)
}

fn execution_price(instrument: &Instrument) -> LedgerResult<Decimal> {
    let price = instrument.current_price();
    if price <= Decimal::ZERO {
        return Err(LedgerError::InvalidPrice(price));
    }
    Ok(price)
}

fn log_outcome(
    side: Side,
    trader_id: &TraderId,
    symbol: &str,
    quantity: i64,
    result: &LedgerResult<Transaction>,
) {
    match result {
        Ok(tx) => info!(
            trader = %trader_id,
            %side,
            symbol,
            quantity,
            price = %tx.price,
            total = %tx.total,
            "Trade executed"
        ),
        Err(e) if e.is_rejection() => warn!(
            trader = %trader_id,
            %side,
            symbol,
            quantity,
            reason = %e,
            "Trade rejected"
        ),
        Err(e) => error!(
            trader = %trader_id,
            %side,
            symbol,
            quantity,
            error = %e,
            "Trade failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_core::error::StoreError;
    use ledger_core::traits::{AccountStore, LedgerHistory, PositionStore};
    use ledger_core::types::{PositionSet, TradeOutcome};
    use ledger_market::{InstrumentBook, StaticQuoteSource, DEFAULT_LISTINGS};
    use ledger_store::MemoryStore;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixture {
        engine: TradingEngine<MemoryStore>,
        quotes: Arc<StaticQuoteSource>,
        trader: TraderId,
    }

    async fn fixture(balance: Decimal) -> Fixture {
        let quotes = Arc::new(StaticQuoteSource::with_default_prices());
        let book = Arc::new(InstrumentBook::new(quotes.clone()));
        book.seed(&DEFAULT_LISTINGS).await;

        let store = Arc::new(MemoryStore::new());
        let trader = Trader::new("alice", "alice@example.com", "Alice", "Liddell", balance);
        store.save_trader(&trader).await.unwrap();

        Fixture {
            engine: TradingEngine::new(store, book),
            quotes,
            trader: trader.id,
        }
    }

    async fn snapshot(f: &Fixture) -> (Decimal, PositionSet, usize) {
        let store = f.engine.store();
        let trader = store.load_trader(&f.trader).await.unwrap().unwrap();
        let positions = store.load_positions(&f.trader).await.unwrap();
        let history = store.list_by_trader(&f.trader).await.unwrap();
        (trader.balance, positions, history.len())
    }

    #[tokio::test]
    async fn test_worked_example() {
        let f = fixture(dec!(10000)).await;

        f.quotes.set_price("AAPL", dec!(150));
        let tx = f.engine.execute_buy(&f.trader, "AAPL", 10).await.unwrap();
        assert_eq!(tx.total, dec!(1500));
        let (balance, positions, _) = snapshot(&f).await;
        assert_eq!(balance, dec!(8500));
        assert_eq!(positions.get("AAPL").unwrap().quantity, 10);
        assert_eq!(positions.get("AAPL").unwrap().average_cost, dec!(150));

        f.quotes.set_price("AAPL", dec!(160));
        f.engine.execute_buy(&f.trader, "AAPL", 5).await.unwrap();
        let (balance, positions, _) = snapshot(&f).await;
        assert_eq!(balance, dec!(7700));
        assert_eq!(positions.get("AAPL").unwrap().quantity, 15);
        assert_eq!(positions.get("AAPL").unwrap().average_cost, dec!(153.33));

        f.quotes.set_price("AAPL", dec!(170));
        let tx = f.engine.execute_sell(&f.trader, "AAPL", 15).await.unwrap();
        assert_eq!(tx.total, dec!(2550));
        assert_eq!(tx.side, Side::Sell);
        let (balance, positions, count) = snapshot(&f).await;
        assert_eq!(balance, dec!(10250));
        assert!(!positions.has_position("AAPL"));
        assert_eq!(count, 3);

        let history = f.engine.history(&f.trader).await.unwrap();
        assert_eq!(history[0].side, Side::Sell);
        assert_eq!(history[0].realized_pnl, Some(dec!(250.05)));
    }

    #[tokio::test]
    async fn test_buy_and_sell_balance_properties() {
        let f = fixture(dec!(5000)).await;
        f.quotes.set_price("AMD", dec!(101.25));

        let (before, positions_before, _) = snapshot(&f).await;
        let tx = f.engine.execute(&f.trader, &TradeRequest::buy("AMD", 7)).await.unwrap();
        let (after, positions_after, _) = snapshot(&f).await;

        assert_eq!(after, before - tx.price * Decimal::from(7));
        assert_eq!(positions_after.quantity("AMD"), positions_before.quantity("AMD") + 7);
        assert_eq!(tx.total, tx.price * Decimal::from(tx.quantity));

        f.quotes.set_price("AMD", dec!(99.10));
        let tx = f.engine.execute(&f.trader, &TradeRequest::sell("AMD", 3)).await.unwrap();
        let (final_balance, positions_final, _) = snapshot(&f).await;
        assert_eq!(final_balance, after + dec!(99.10) * Decimal::from(3));
        assert_eq!(positions_final.quantity("AMD"), 4);
        assert_eq!(tx.price, dec!(99.10));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let f = fixture(dec!(10000)).await;
        let before = snapshot(&f).await;

        for quantity in [0, -5] {
            let err = f.engine.execute_buy(&f.trader, "AAPL", quantity).await.unwrap_err();
            assert!(matches!(err, LedgerError::InvalidQuantity(q) if q == quantity));
            let err = f.engine.execute_sell(&f.trader, "AAPL", quantity).await.unwrap_err();
            assert!(matches!(err, LedgerError::InvalidQuantity(_)));
        }
        assert_eq!(snapshot(&f).await, before);
    }

    #[tokio::test]
    async fn test_unknown_instrument_rejected() {
        let f = fixture(dec!(10000)).await;

        let err = f.engine.execute_buy(&f.trader, "XYZ", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::InstrumentNotFound(ref s) if s == "XYZ"));
        assert_eq!(err.outcome(), Some(TradeOutcome::Rejected));

        let err = f.engine.execute_sell(&f.trader, "XYZ", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::InstrumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_state_unchanged() {
        let f = fixture(dec!(1000)).await;
        f.quotes.set_price("MSFT", dec!(300));
        f.engine.execute_buy(&f.trader, "MSFT", 2).await.unwrap();
        let before = snapshot(&f).await;

        let err = f.engine.execute_buy(&f.trader, "MSFT", 2).await.unwrap_err();
        match err {
            LedgerError::InsufficientFunds { required, available } => {
                assert_eq!(required, dec!(600));
                assert_eq!(available, dec!(400));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(snapshot(&f).await, before);
    }

    #[tokio::test]
    async fn test_exact_balance_buy_is_allowed() {
        let f = fixture(dec!(1500)).await;
        f.quotes.set_price("AAPL", dec!(150));

        f.engine.execute_buy(&f.trader, "AAPL", 10).await.unwrap();
        let (balance, _, _) = snapshot(&f).await;
        assert_eq!(balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_oversell_leaves_state_unchanged() {
        let f = fixture(dec!(10000)).await;
        f.engine.execute_buy(&f.trader, "AAPL", 10).await.unwrap();
        let before = snapshot(&f).await;

        let err = f.engine.execute_sell(&f.trader, "AAPL", 11).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientShares { requested: 11, held: 10, .. }
        ));
        assert_eq!(snapshot(&f).await, before);

        let err = f.engine.execute_sell(&f.trader, "NVDA", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientShares { held: 0, .. }));
    }

    #[tokio::test]
    async fn test_unknown_trader() {
        let f = fixture(dec!(10000)).await;
        let ghost = TraderId::new();

        let err = f.engine.execute_buy(&ghost, "AAPL", 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::TraderNotFound(_)));
        assert!(matches!(
            f.engine.history(&ghost).await,
            Err(LedgerError::TraderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_quote_outage_trades_at_last_known_price() {
        let f = fixture(dec!(10000)).await;
        f.quotes.set_price("AAPL", dec!(155));
        f.engine.execute_buy(&f.trader, "AAPL", 1).await.unwrap();

        f.quotes.set_offline(true);
        let tx = f.engine.execute_buy(&f.trader, "AAPL", 1).await.unwrap();
        assert_eq!(tx.price, dec!(155));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sells_never_oversell() {
        let f = Arc::new(fixture(dec!(10000)).await);
        f.engine.execute_buy(&f.trader, "AAPL", 10).await.unwrap();

        let a = {
            let f = f.clone();
            tokio::spawn(async move { f.engine.execute_sell(&f.trader, "AAPL", 10).await })
        };
        let b = {
            let f = f.clone();
            tokio::spawn(async move { f.engine.execute_sell(&f.trader, "AAPL", 10).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientShares { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);

        let (balance, positions, count) = snapshot(&f).await;
        assert_eq!(balance, dec!(10000));
        assert!(positions.is_empty());
        assert_eq!(count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_single_share_sells() {
        let f = Arc::new(fixture(dec!(10000)).await);
        f.engine.execute_buy(&f.trader, "AMD", 10).await.unwrap();

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let f = f.clone();
                tokio::spawn(async move { f.engine.execute_sell(&f.trader, "AMD", 1).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        let (_, positions, count) = snapshot(&f).await;
        assert!(positions.is_empty());
        assert_eq!(count, 11);
    }

    #[tokio::test]
    async fn test_summary() {
        let f = fixture(dec!(10000)).await;
        f.quotes.set_price("AAPL", dec!(150));
        f.engine.execute_buy(&f.trader, "AAPL", 10).await.unwrap();
        f.quotes.set_price("INTC", dec!(50));
        f.engine.execute_buy(&f.trader, "INTC", 20).await.unwrap();
        f.engine.execute_sell(&f.trader, "INTC", 10).await.unwrap();

        f.quotes.set_price("AAPL", dec!(170));
        f.quotes.set_price("INTC", dec!(45));
        let summary = f.engine.portfolio_summary(&f.trader).await.unwrap();

        // Cash: 10000 - 1500 - 1000 + 500
        assert_eq!(summary.cash_balance, dec!(8000));
        assert_eq!(summary.positions_value, dec!(2150));
        assert_eq!(summary.total_value, dec!(10150));
        assert_eq!(summary.realized_pnl, Decimal::ZERO);
        assert_eq!(summary.position("AAPL").unwrap().unrealized_pnl, dec!(200));
        assert_eq!(summary.position("INTC").unwrap().quantity, 10);
    }

    /// Store whose commits can be made to fail.
    struct FlakyStore {
        inner: MemoryStore,
        fail_commits: AtomicBool,
    }

    #[async_trait]
    impl AccountStore for FlakyStore {
        async fn load_trader(&self, id: &TraderId) -> Result<Option<Trader>, StoreError> {
            self.inner.load_trader(id).await
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<Trader>, StoreError> {
            self.inner.find_by_username(username).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<Trader>, StoreError> {
            self.inner.find_by_email(email).await
        }
        async fn list_traders(&self) -> Result<Vec<Trader>, StoreError> {
            self.inner.list_traders().await
        }
        async fn save_trader(&self, trader: &Trader) -> Result<(), StoreError> {
            self.inner.save_trader(trader).await
        }
    }

    #[async_trait]
    impl PositionStore for FlakyStore {
        async fn load_positions(&self, id: &TraderId) -> Result<PositionSet, StoreError> {
            self.inner.load_positions(id).await
        }
        async fn save_positions(&self, positions: &PositionSet) -> Result<(), StoreError> {
            self.inner.save_positions(positions).await
        }
    }

    #[async_trait]
    impl LedgerHistory for FlakyStore {
        async fn append(&self, transaction: &Transaction) -> Result<(), StoreError> {
            self.inner.append(transaction).await
        }
        async fn list_by_trader(&self, id: &TraderId) -> Result<Vec<Transaction>, StoreError> {
            self.inner.list_by_trader(id).await
        }
    }

    #[async_trait]
    impl TradeStore for FlakyStore {
        async fn commit(&self, commit: TradeCommit) -> Result<(), StoreError> {
            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("connection reset".to_string()));
            }
            self.inner.commit(commit).await
        }
        async fn remove_trader(&self, id: &TraderId) -> Result<bool, StoreError> {
            self.inner.remove_trader(id).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_rejection_and_changes_nothing() {
        let quotes = Arc::new(StaticQuoteSource::with_default_prices());
        let book = Arc::new(InstrumentBook::new(quotes));
        book.seed(&DEFAULT_LISTINGS).await;

        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_commits: AtomicBool::new(false),
        });
        let trader = Trader::new("bob", "bob@example.com", "Bob", "Smith", dec!(10000));
        store.save_trader(&trader).await.unwrap();

        let engine = TradingEngine::new(store.clone(), book);
        engine.execute_buy(&trader.id, "AAPL", 10).await.unwrap();

        store.fail_commits.store(true, Ordering::SeqCst);
        let err = engine.execute_sell(&trader.id, "AAPL", 5).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(_)));
        assert!(!err.is_rejection());
        assert_eq!(err.outcome(), None);

        let loaded = store.load_trader(&trader.id).await.unwrap().unwrap();
        assert_eq!(loaded.balance, dec!(8500));
        assert_eq!(store.load_positions(&trader.id).await.unwrap().quantity("AAPL"), 10);
        assert_eq!(store.list_by_trader(&trader.id).await.unwrap().len(), 1);
    }
}
