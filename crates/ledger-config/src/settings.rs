//! Configuration structures.

use config::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub quotes: QuoteSettings,
    #[serde(default)]
    pub accounts: AccountSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl AppConfig {
    /// Reject values that deserialize but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        if self.accounts.initial_balance < Decimal::ZERO {
            return Err(invalid("accounts.initial_balance must not be negative"));
        }
        if self.accounts.admin_balance < Decimal::ZERO {
            return Err(invalid("accounts.admin_balance must not be negative"));
        }
        if self.accounts.admin_username.trim().is_empty() {
            return Err(invalid("accounts.admin_username must not be empty"));
        }
        if self.quotes.timeout_secs == 0 {
            return Err(invalid("quotes.timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Message(message.into())
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-ledger".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Where instrument prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteProvider {
    /// Finnhub REST API
    Finnhub,
    /// In-process fixed prices
    #[default]
    Static,
}

/// Quote source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    pub provider: QuoteProvider,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl QuoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            provider: QuoteProvider::Static,
            api_key_env: "FINNHUB_API_KEY".to_string(),
            base_url: "https://finnhub.io/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Account bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub initial_balance: Decimal,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_balance: Decimal,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            admin_username: "admin".to_string(),
            admin_email: "admin@tradingplatform.com".to_string(),
            admin_balance: dec!(100000),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// JSON snapshot file. State lives only in memory when unset.
    pub snapshot_path: Option<PathBuf>,
}
