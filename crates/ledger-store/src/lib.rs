//! Storage backends for the trading ledger.

mod csv_export;
mod memory;

pub use csv_export::write_history_csv;
pub use memory::MemoryStore;
