//! Instrument listing command.

use anyhow::Result;
use ledger_monitor::instruments_report;

use crate::cli::context::Ledger;
use crate::cli::{InstrumentsArgs, OutputFormat};

pub async fn run(args: InstrumentsArgs, ledger: &Ledger) -> Result<()> {
    if args.refresh {
        ledger.book.refresh_all().await;
    }

    let instruments = match (&args.sector, &args.industry) {
        (Some(sector), _) => ledger.book.by_sector(sector),
        (None, Some(industry)) => ledger.book.by_industry(industry),
        (None, None) => ledger.book.list(),
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&instruments)?),
        OutputFormat::Text => println!("{}", instruments_report(&instruments)),
    }
    Ok(())
}
