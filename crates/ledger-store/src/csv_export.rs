//! CSV export of transaction history.

use ledger_core::error::StoreError;
use ledger_core::types::Transaction;
use serde::Serialize;
use std::io::Write;

/// One CSV row.
#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    id: String,
    executed_at: String,
    symbol: &'a str,
    name: &'a str,
    side: String,
    quantity: u64,
    price: String,
    total: String,
    realized_pnl: String,
}

impl<'a> From<&'a Transaction> for HistoryRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            executed_at: tx.executed_at.to_rfc3339(),
            symbol: &tx.symbol,
            name: &tx.instrument_name,
            side: tx.side.to_string(),
            quantity: tx.quantity,
            price: tx.price.to_string(),
            total: tx.total.to_string(),
            realized_pnl: tx.realized_pnl.map(|p| p.to_string()).unwrap_or_default(),
        }
    }
}

/// Write transactions as CSV with a header row, in the order given.
pub fn write_history_csv<W: Write>(
    transactions: &[Transaction],
    writer: W,
) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transactions {
        wtr.serialize(HistoryRow::from(tx))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
