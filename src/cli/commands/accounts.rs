//! Account commands.

use anyhow::{Context, Result};
use ledger_engine::NewTrader;
use ledger_monitor::traders_report;

use crate::cli::context::Ledger;
use crate::cli::{RegisterArgs, SetBalanceArgs};

pub async fn register(args: RegisterArgs, ledger: &Ledger) -> Result<()> {
    let form = NewTrader::new(args.username, args.email, args.first_name, args.last_name);
    let trader = ledger
        .accounts
        .register(form)
        .await
        .context("Registration failed")?;

    println!("Registered {} ({})", trader.username, trader.full_name());
    println!("  Id:        {}", trader.id);
    println!("  Balance:   ${:.2}", trader.balance);
    Ok(())
}

pub async fn traders(ledger: &Ledger) -> Result<()> {
    let traders = ledger.accounts.list_traders().await?;
    println!("{}", traders_report(&traders));
    Ok(())
}

pub async fn set_balance(args: SetBalanceArgs, ledger: &Ledger) -> Result<()> {
    let admin = ledger.trader(&args.admin).await?;
    let trader = ledger.trader(&args.trader).await?;

    let updated = ledger
        .accounts
        .set_balance(&admin.id, &trader.id, args.balance)
        .await
        .context("Balance update failed")?;

    println!(
        "Balance of {} set to ${:.2} (was ${:.2})",
        updated.username, updated.balance, trader.balance
    );
    Ok(())
}
