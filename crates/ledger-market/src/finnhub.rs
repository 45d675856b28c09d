//! Finnhub quote source.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ledger_core::error::QuoteError;
use ledger_core::round_half_up;
use ledger_core::traits::QuoteSource;
use ledger_core::types::Quote;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Finnhub API configuration.
#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl FinnhubConfig {
    /// Create config directly with a key.
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self { api_key, base_url, timeout }
    }

    /// Load the API key from the given environment variable.
    pub fn from_env(
        key_var: &str,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, QuoteError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| QuoteError::Configuration(format!("{} not set", key_var)))?;
        Ok(Self::new(api_key, base_url, timeout))
    }
}

/// `/quote` response body.
#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price
    c: f64,
    /// High of the day
    h: Option<f64>,
    /// Low of the day
    l: Option<f64>,
    /// Open of the day
    o: Option<f64>,
    /// Previous close
    pc: f64,
    /// Unix seconds
    t: Option<i64>,
}

/// Quote source backed by the Finnhub REST API.
pub struct FinnhubQuoteSource {
    config: FinnhubConfig,
    client: Client,
}

impl FinnhubQuoteSource {
    /// Create a new client.
    pub fn new(config: FinnhubConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuoteError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn to_price(value: f64) -> Result<Decimal, QuoteError> {
        Decimal::from_f64_retain(value)
            .map(|d| round_half_up(d, 2))
            .ok_or_else(|| QuoteError::Parse(format!("not a price: {}", value)))
    }

    fn to_optional_price(value: Option<f64>) -> Option<Decimal> {
        value
            .filter(|v| *v > 0.0)
            .and_then(|v| Self::to_price(v).ok())
    }

    fn parse_quote(symbol: &str, raw: FinnhubQuote) -> Result<Quote, QuoteError> {
        let current = Self::to_price(raw.c)?;
        if current <= Decimal::ZERO {
            // Finnhub answers unknown symbols with an all-zero body
            return Err(QuoteError::NoData(symbol.to_string()));
        }

        let timestamp = raw
            .t
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            current,
            previous_close: Self::to_price(raw.pc)?,
            open: Self::to_optional_price(raw.o),
            high: Self::to_optional_price(raw.h),
            low: Self::to_optional_price(raw.l),
            timestamp,
        })
    }
}

#[async_trait]
impl QuoteSource for FinnhubQuoteSource {
    async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let url = format!("{}/quote", self.config.base_url.trim_end_matches('/'));
        debug!(symbol, "Fetching Finnhub quote");

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("token", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| QuoteError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(QuoteError::Api(format!("{}: {}", status, text)));
        }

        let raw: FinnhubQuote = resp
            .json()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        Self::parse_quote(symbol, raw)
    }

    fn name(&self) -> &str {
        "Finnhub"
    }
}
