//! Trading ledger CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::commands;
use cli::context::Ledger;
use cli::{Cli, Commands};
use ledger_config::{load_config, AppConfig};
use ledger_core::types::Side;
use ledger_monitor::setup_logging;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Validation reports its own errors, before anything else is set up
    if let Commands::ValidateConfig = cli.command {
        return commands::config::validate(&cli.config).await;
    }

    let (config, missing) = if cli.config.exists() {
        let config = load_config(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?;
        (config, false)
    } else {
        (AppConfig::default(), true)
    };

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.is_json();
    let _guard = setup_logging(&level, json, config.logging.file.as_deref())
        .context("Failed to open log file")?;

    if missing {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    // Execute command
    match cli.command {
        Commands::PrintConfig => commands::config::print(&config).await,
        Commands::Demo => commands::demo::run(&config).await,
        Commands::ValidateConfig => Ok(()),
        command => {
            let ledger = Ledger::open(config).await?;
            match command {
                Commands::Register(args) => commands::accounts::register(args, &ledger).await,
                Commands::Buy(args) => commands::trade::run(Side::Buy, args, &ledger).await,
                Commands::Sell(args) => commands::trade::run(Side::Sell, args, &ledger).await,
                Commands::Portfolio(args) => commands::portfolio::portfolio(args, &ledger).await,
                Commands::History(args) => commands::portfolio::history(args, &ledger).await,
                Commands::Instruments(args) => commands::instruments::run(args, &ledger).await,
                Commands::Traders => commands::accounts::traders(&ledger).await,
                Commands::SetBalance(args) => commands::accounts::set_balance(args, &ledger).await,
                Commands::PrintConfig | Commands::Demo | Commands::ValidateConfig => Ok(()),
            }
        }
    }
}
