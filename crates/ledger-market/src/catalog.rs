//! Instrument catalog with fail-soft price refresh.

use async_trait::async_trait;
use futures::future::join_all;
use ledger_core::error::StoreError;
use ledger_core::traits::{InstrumentSource, QuoteSource};
use ledger_core::types::{Instrument, PriceSnapshot};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::listings::{default_previous_close, default_price, Listing};

/// Listed instruments keyed by symbol.
///
/// Prices are refreshed from the quote source on read. When the source
/// fails, the instrument keeps its last known price.
pub struct InstrumentBook {
    instruments: RwLock<BTreeMap<String, Instrument>>,
    source: Arc<dyn QuoteSource>,
}

impl InstrumentBook {
    /// Create an empty catalog.
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self {
            instruments: RwLock::new(BTreeMap::new()),
            source,
        }
    }

    /// Name of the underlying quote source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// List `listings` if the catalog is empty.
    ///
    /// Each listing is priced from the quote source, falling back to the
    /// default price table. Returns the number of instruments created.
    pub async fn seed(&self, listings: &[Listing]) -> usize {
        if !self.is_empty() {
            debug!("Catalog already seeded");
            return 0;
        }

        info!(count = listings.len(), source = self.source.name(), "Seeding instrument catalog");

        let quotes = join_all(listings.iter().map(|l| self.source.quote(l.symbol))).await;

        let mut created = 0;
        for (listing, quote) in listings.iter().zip(quotes) {
            let instrument = match quote {
                Ok(quote) if quote.is_valid() => {
                    let mut instrument = Instrument::new(
                        listing.symbol,
                        listing.name,
                        quote.current,
                        quote.previous_close,
                        listing.sector,
                        listing.industry,
                    )
                    .with_description(format!("Real-time stock data for {}", listing.name));
                    instrument.apply_quote(&quote);
                    instrument
                }
                other => {
                    if let Err(e) = other {
                        warn!(
                            symbol = listing.symbol,
                            error = %e,
                            "Quote unavailable, listing with default price"
                        );
                    }
                    Instrument::new(
                        listing.symbol,
                        listing.name,
                        default_price(listing.symbol),
                        default_previous_close(listing.symbol),
                        listing.sector,
                        listing.industry,
                    )
                    .with_description(format!("Fallback stock data for {}", listing.name))
                }
            };

            if self.insert(instrument) {
                created += 1;
            }
        }

        created
    }

    /// Add an instrument. Returns false if the symbol is already listed.
    pub fn insert(&self, instrument: Instrument) -> bool {
        let mut instruments = self.instruments.write();
        if instruments.contains_key(&instrument.symbol) {
            return false;
        }
        instruments.insert(instrument.symbol.clone(), instrument);
        true
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.read().contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.instruments.read().len()
    }

    /// Last known state of an instrument, without refreshing.
    pub fn cached(&self, symbol: &str) -> Option<Instrument> {
        self.instruments.read().get(symbol).cloned()
    }

    /// All instruments ordered by symbol, without refreshing.
    pub fn list(&self) -> Vec<Instrument> {
        self.instruments.read().values().cloned().collect()
    }

    pub fn by_sector(&self, sector: &str) -> Vec<Instrument> {
        self.filter(|i| i.sector.eq_ignore_ascii_case(sector))
    }

    pub fn by_industry(&self, industry: &str) -> Vec<Instrument> {
        self.filter(|i| i.industry.eq_ignore_ascii_case(industry))
    }

    fn filter(&self, predicate: impl Fn(&Instrument) -> bool) -> Vec<Instrument> {
        self.instruments
            .read()
            .values()
            .filter(|i| predicate(i))
            .cloned()
            .collect()
    }

    /// Refresh one instrument from the quote source and return it.
    ///
    /// Returns `None` only for an unlisted symbol.
    pub async fn refresh(&self, symbol: &str) -> Option<Instrument> {
        if !self.contains(symbol) {
            return None;
        }

        // No lock is held across the oracle call
        let quote = self.source.quote(symbol).await;

        let mut instruments = self.instruments.write();
        let instrument = instruments.get_mut(symbol)?;

        match quote {
            Ok(quote) => {
                if instrument.apply_quote(&quote) {
                    debug!(symbol, price = %quote.current, "Updated price");
                } else {
                    warn!(symbol, "Ignoring quote without a positive price");
                }
            }
            Err(e) => {
                warn!(
                    symbol,
                    error = %e,
                    last_price = %instrument.current_price(),
                    "Quote refresh failed, keeping last known price"
                );
            }
        }

        Some(instrument.clone())
    }

    /// Refresh every listed instrument. Returns the number refreshed.
    pub async fn refresh_all(&self) -> usize {
        let symbols: Vec<String> = self.instruments.read().keys().cloned().collect();
        let refreshed = join_all(symbols.iter().map(|s| self.refresh(s)))
            .await
            .into_iter()
            .flatten()
            .count();

        info!(count = refreshed, "Refreshed instrument prices");
        refreshed
    }

    /// Refresh `symbols`, then read all their prices under one lock.
    pub async fn snapshot(&self, symbols: &[String]) -> PriceSnapshot {
        join_all(symbols.iter().map(|s| self.refresh(s))).await;

        let instruments = self.instruments.read();
        symbols
            .iter()
            .filter_map(|s| instruments.get(s).map(|i| (s.clone(), i.current_price())))
            .collect()
    }
}

#[async_trait]
impl InstrumentSource for InstrumentBook {
    async fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(self.refresh(symbol).await)
    }

    async fn price_snapshot(&self, symbols: &[String]) -> Result<PriceSnapshot, StoreError> {
        Ok(self.snapshot(symbols).await)
    }
}
