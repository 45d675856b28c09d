//! Wiring of store, market and services from configuration.

use anyhow::{Context, Result};
use ledger_config::{AppConfig, QuoteProvider, QuoteSettings};
use ledger_core::traits::QuoteSource;
use ledger_core::types::Trader;
use ledger_engine::{AccountPolicy, AccountService, NewTrader, TradingEngine};
use ledger_market::{
    FinnhubConfig, FinnhubQuoteSource, InstrumentBook, StaticQuoteSource, DEFAULT_LISTINGS,
};
use ledger_store::MemoryStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a command needs, built once per process.
pub struct Ledger {
    pub store: Arc<MemoryStore>,
    pub book: Arc<InstrumentBook>,
    pub engine: TradingEngine<MemoryStore>,
    pub accounts: AccountService<MemoryStore>,
}

impl Ledger {
    /// Open the configured store, seed the catalog and bootstrap the admin.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let store = match &config.store.snapshot_path {
            Some(path) => MemoryStore::open(path)
                .with_context(|| format!("Failed to open ledger snapshot {}", path.display()))?,
            None => MemoryStore::new(),
        };
        let source = quote_source(&config.quotes)?;
        Self::assemble(&config, Arc::new(store), source).await
    }

    /// Build a ledger on explicit parts.
    pub async fn assemble(
        config: &AppConfig,
        store: Arc<MemoryStore>,
        source: Arc<dyn QuoteSource>,
    ) -> Result<Self> {
        let book = Arc::new(InstrumentBook::new(source));
        let seeded = book.seed(&DEFAULT_LISTINGS).await;
        debug!(seeded, source = book.source_name(), "Instrument catalog ready");

        let engine = TradingEngine::new(store.clone(), book.clone());
        let policy = AccountPolicy {
            initial_balance: config.accounts.initial_balance,
            admin_balance: config.accounts.admin_balance,
        };
        let accounts = AccountService::new(store.clone(), engine.locks().clone(), policy);

        let admin = accounts
            .ensure_admin(NewTrader::new(
                &config.accounts.admin_username,
                &config.accounts.admin_email,
                "System",
                "Administrator",
            ))
            .await
            .context("Failed to bootstrap admin account")?;
        debug!(admin = %admin.username, "Admin account ready");

        Ok(Self {
            store,
            book,
            engine,
            accounts,
        })
    }

    /// Resolve a trader by username.
    pub async fn trader(&self, username: &str) -> Result<Trader> {
        self.accounts
            .find_by_username(username)
            .await?
            .with_context(|| format!("No trader named '{}'", username))
    }
}

fn quote_source(settings: &QuoteSettings) -> Result<Arc<dyn QuoteSource>> {
    match settings.provider {
        QuoteProvider::Static => Ok(Arc::new(StaticQuoteSource::with_default_prices())),
        QuoteProvider::Finnhub => {
            let config = FinnhubConfig::from_env(
                &settings.api_key_env,
                settings.base_url.clone(),
                settings.timeout(),
            )
            .context("Finnhub quotes require an API key")?;
            info!(base_url = %config.base_url, "Using Finnhub quotes");
            Ok(Arc::new(FinnhubQuoteSource::new(config)?))
        }
    }
}
