//! Seed listings and the default price table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Static description of a listed security.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
    pub industry: &'static str,
}

impl Listing {
    pub const fn new(
        symbol: &'static str,
        name: &'static str,
        sector: &'static str,
        industry: &'static str,
    ) -> Self {
        Self { symbol, name, sector, industry }
    }
}

/// Instruments listed on a fresh catalog.
pub const DEFAULT_LISTINGS: [Listing; 10] = [
    Listing::new("AAPL", "Apple Inc.", "Technology", "Consumer Electronics"),
    Listing::new("GOOGL", "Alphabet Inc.", "Technology", "Internet Content & Information"),
    Listing::new("MSFT", "Microsoft Corporation", "Technology", "Software"),
    Listing::new(
        "AMZN",
        "Amazon.com Inc.",
        "Consumer Discretionary",
        "Internet & Direct Marketing Retail",
    ),
    Listing::new("TSLA", "Tesla Inc.", "Consumer Discretionary", "Automobiles"),
    Listing::new("META", "Meta Platforms Inc.", "Technology", "Social Media"),
    Listing::new("NVDA", "NVIDIA Corporation", "Technology", "Semiconductors"),
    Listing::new("NFLX", "Netflix Inc.", "Communication Services", "Entertainment"),
    Listing::new("AMD", "Advanced Micro Devices Inc.", "Technology", "Semiconductors"),
    Listing::new("INTC", "Intel Corporation", "Technology", "Semiconductors"),
];

/// Fallback price when no quote could be fetched at listing time.
pub fn default_price(symbol: &str) -> Decimal {
    match symbol {
        "AAPL" => dec!(150.00),
        "GOOGL" => dec!(2500.00),
        "MSFT" => dec!(300.00),
        "AMZN" => dec!(3200.00),
        "TSLA" => dec!(800.00),
        "META" => dec!(320.00),
        "NVDA" => dec!(450.00),
        "NFLX" => dec!(400.00),
        "AMD" => dec!(100.00),
        "INTC" => dec!(50.00),
        _ => dec!(100.00),
    }
}

/// Fallback previous close: 98% of the default price.
pub fn default_previous_close(symbol: &str) -> Decimal {
    ledger_core::round_half_up(default_price(symbol) * dec!(0.98), 2)
}
