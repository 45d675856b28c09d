//! Deterministic in-process quote source.

use async_trait::async_trait;
use ledger_core::error::QuoteError;
use ledger_core::traits::QuoteSource;
use ledger_core::types::Quote;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::listings::{default_previous_close, default_price, DEFAULT_LISTINGS};

/// Quote source backed by a price map.
///
/// Used offline and in tests. Prices can be moved and an outage can be
/// simulated.
pub struct StaticQuoteSource {
    quotes: RwLock<HashMap<String, Quote>>,
    offline: AtomicBool,
}

impl StaticQuoteSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Create a source quoting the default price table for the default listings.
    pub fn with_default_prices() -> Self {
        let source = Self::new();
        for listing in DEFAULT_LISTINGS.iter() {
            source.set_quote(Quote::new(
                listing.symbol,
                default_price(listing.symbol),
                default_previous_close(listing.symbol),
            ));
        }
        source
    }

    /// Set a price, keeping the previous close of an existing quote.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        let mut quotes = self.quotes.write();
        let previous_close = quotes
            .get(symbol)
            .map(|q| q.previous_close)
            .unwrap_or(price);
        quotes.insert(symbol.to_string(), Quote::new(symbol, price, previous_close));
    }

    /// Insert or replace a full quote.
    pub fn set_quote(&self, quote: Quote) {
        self.quotes.write().insert(quote.symbol.clone(), quote);
    }

    /// Make every request fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Default for StaticQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(QuoteError::Connection("static source is offline".to_string()));
        }

        let quotes = self.quotes.read();
        quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| QuoteError::NoData(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "Static Quotes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_static_quotes() {
        let source = StaticQuoteSource::with_default_prices();
        let quote = source.quote("NVDA").await.unwrap();
        assert_eq!(quote.current, dec!(450));
        assert_eq!(quote.previous_close, dec!(441));

        source.set_price("NVDA", dec!(470));
        let quote = source.quote("NVDA").await.unwrap();
        assert_eq!(quote.current, dec!(470));
        assert_eq!(quote.previous_close, dec!(441));

        assert!(matches!(source.quote("XYZ").await, Err(QuoteError::NoData(_))));
    }

    #[tokio::test]
    async fn test_offline() {
        let source = StaticQuoteSource::with_default_prices();
        source.set_offline(true);
        assert!(matches!(source.quote("AAPL").await, Err(QuoteError::Connection(_))));

        source.set_offline(false);
        assert!(source.quote("AAPL").await.is_ok());
    }
}
