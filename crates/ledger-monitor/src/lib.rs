//! Logging setup and text reports.

mod logging;
mod report;

pub use logging::setup_logging;
pub use report::{instruments_report, history_report, portfolio_report, traders_report};
