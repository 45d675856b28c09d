//! Configuration commands.

use anyhow::Result;
use ledger_config::{load_config, AppConfig};
use std::path::Path;

pub async fn validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Quote provider: {:?}", config.quotes.provider);
            println!("Initial balance: ${}", config.accounts.initial_balance);
            println!("Admin: {}", config.accounts.admin_username);
            match &config.store.snapshot_path {
                Some(path) => println!("Snapshot: {}", path.display()),
                None => println!("Snapshot: (in memory only)"),
            }
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn print(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
