//! Configuration management.

mod settings;

pub use settings::{
    AccountSettings, AppConfig, AppSettings, LoggingConfig, QuoteProvider, QuoteSettings,
    StoreSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// Environment variables use the `LEDGER` prefix with `__` between
/// segments, e.g. `LEDGER__QUOTES__PROVIDER=finnhub`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("LEDGER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}
