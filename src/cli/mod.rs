//! CLI definitions.

pub mod commands;
pub mod context;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author, version, about = "Simulated stock trading ledger")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "LEDGER_CONFIG")]
    pub config: PathBuf,

    /// Log level, overriding the configured one
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new trader
    Register(RegisterArgs),
    /// Buy shares at the current price
    Buy(TradeArgs),
    /// Sell shares at the current price
    Sell(TradeArgs),
    /// Show a trader's portfolio
    Portfolio(PortfolioArgs),
    /// Show a trader's transaction history
    History(HistoryArgs),
    /// List instruments
    Instruments(InstrumentsArgs),
    /// List registered traders
    Traders,
    /// Override a trader's cash balance (admin only)
    SetBalance(SetBalanceArgs),
    /// Run a scripted buy/buy/sell session on a throwaway ledger
    Demo,
    /// Validate configuration
    ValidateConfig,
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    /// Unique username
    #[arg(short, long)]
    pub username: String,

    /// Unique email address
    #[arg(short, long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,
}

#[derive(clap::Args)]
pub struct TradeArgs {
    /// Trader username
    #[arg(short, long)]
    pub trader: String,

    /// Instrument symbol
    #[arg(short, long)]
    pub symbol: String,

    /// Number of shares
    #[arg(short, long, allow_negative_numbers = true)]
    pub quantity: i64,
}

#[derive(clap::Args)]
pub struct PortfolioArgs {
    /// Trader username
    #[arg(short, long)]
    pub trader: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// Trader username
    #[arg(short, long)]
    pub trader: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Also export the history to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct InstrumentsArgs {
    /// Only instruments in this sector
    #[arg(long)]
    pub sector: Option<String>,

    /// Only instruments in this industry
    #[arg(long, conflicts_with = "sector")]
    pub industry: Option<String>,

    /// Refresh all prices from the quote source first
    #[arg(long)]
    pub refresh: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct SetBalanceArgs {
    /// Username of the acting admin
    #[arg(long)]
    pub admin: String,

    /// Username of the trader to update
    #[arg(long)]
    pub trader: String,

    /// New balance
    #[arg(long)]
    pub balance: Decimal,
}
