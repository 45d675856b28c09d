//! Market data collaborator traits.

use async_trait::async_trait;

use crate::error::{QuoteError, StoreError};
use crate::types::{Instrument, PriceSnapshot, Quote};

/// Trait for current-price oracles.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Get the latest quote for a symbol.
    async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError>;

    /// Get the source name.
    fn name(&self) -> &str;
}

/// Read path for instruments as seen by the ledger engine.
///
/// Implementations own the price fallback policy: a returned instrument
/// always carries a usable price, even when the quote source is down.
#[async_trait]
pub trait InstrumentSource: Send + Sync {
    /// Resolve an instrument with a refreshed price.
    async fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, StoreError>;

    /// Prices for `symbols` read as one consistent snapshot.
    ///
    /// Unknown symbols are absent from the result.
    async fn price_snapshot(&self, symbols: &[String]) -> Result<PriceSnapshot, StoreError>;
}
