//! Scripted session on a throwaway in-memory ledger.

use anyhow::Result;
use ledger_config::AppConfig;
use ledger_core::traits::PositionStore;
use ledger_core::types::TradeRequest;
use ledger_engine::NewTrader;
use ledger_market::StaticQuoteSource;
use ledger_monitor::{history_report, portfolio_report};
use ledger_store::MemoryStore;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::cli::context::Ledger;

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut config = config.clone();
    config.store.snapshot_path = None;

    let quotes = Arc::new(StaticQuoteSource::with_default_prices());
    let ledger = Ledger::assemble(&config, Arc::new(MemoryStore::new()), quotes.clone()).await?;

    let trader = ledger
        .accounts
        .register(NewTrader::new("demo", "demo@example.com", "Demo", "Trader"))
        .await?;
    println!("Registered '{}' with ${:.2}", trader.username, trader.balance);
    println!();

    let steps = [
        (dec!(150), TradeRequest::buy("AAPL", 10)),
        (dec!(160), TradeRequest::buy("AAPL", 5)),
        (dec!(170), TradeRequest::sell("AAPL", 15)),
    ];

    for (price, request) in steps {
        quotes.set_price(&request.symbol, price);
        let tx = ledger.engine.execute(&trader.id, &request).await?;

        let balance = ledger.accounts.get(&trader.id).await?.balance;
        let held = ledger
            .store
            .load_positions(&trader.id)
            .await?
            .get("AAPL")
            .map(|p| format!("{} @ avg {:.2}", p.quantity, p.average_cost))
            .unwrap_or_else(|| "none".to_string());

        println!(
            "{:<5} {:>3} AAPL @ ${:.2}  total ${:>8.2}  balance ${:>9.2}  position {}",
            tx.side.to_string(),
            tx.quantity,
            tx.price,
            tx.total,
            balance,
            held
        );
    }
    println!();

    let summary = ledger.engine.portfolio_summary(&trader.id).await?;
    println!("{}", portfolio_report(&trader, &summary));

    let history = ledger.engine.history(&trader.id).await?;
    println!("{}", history_report(&trader, &history));

    Ok(())
}
