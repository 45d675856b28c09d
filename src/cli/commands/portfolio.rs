//! Portfolio and history commands.

use anyhow::{Context, Result};
use ledger_monitor::{history_report, portfolio_report};
use ledger_store::write_history_csv;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

use crate::cli::context::Ledger;
use crate::cli::{HistoryArgs, OutputFormat, PortfolioArgs};

pub async fn portfolio(args: PortfolioArgs, ledger: &Ledger) -> Result<()> {
    let trader = ledger.trader(&args.trader).await?;
    let summary = ledger.engine.portfolio_summary(&trader.id).await?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => println!("{}", portfolio_report(&trader, &summary)),
    }
    Ok(())
}

pub async fn history(args: HistoryArgs, ledger: &Ledger) -> Result<()> {
    let trader = ledger.trader(&args.trader).await?;
    let transactions = ledger.engine.history(&trader.id).await?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transactions)?),
        OutputFormat::Text => println!("{}", history_report(&trader, &transactions)),
    }

    if let Some(path) = &args.csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_history_csv(&transactions, BufWriter::new(file))?;
        info!(path = %path.display(), rows = transactions.len(), "History exported");
    }
    Ok(())
}
