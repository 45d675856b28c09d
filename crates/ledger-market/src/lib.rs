//! Instrument catalog and quote sources.

mod catalog;
mod finnhub;
mod listings;
mod static_source;

pub use catalog::InstrumentBook;
pub use finnhub::{FinnhubConfig, FinnhubQuoteSource};
pub use listings::{default_previous_close, default_price, Listing, DEFAULT_LISTINGS};
pub use static_source::StaticQuoteSource;
