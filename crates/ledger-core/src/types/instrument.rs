//! Tradeable instruments and price quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_half_up;

/// Decimal places kept for the change percentage.
pub const CHANGE_PERCENT_SCALE: u32 = 4;

/// A point-in-time quote from a quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    /// Last traded price
    pub current: Decimal,
    /// Previous session close
    pub previous_close: Decimal,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote with only current and previous close.
    pub fn new(symbol: impl Into<String>, current: Decimal, previous_close: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            current,
            previous_close,
            open: None,
            high: None,
            low: None,
            timestamp: Utc::now(),
        }
    }

    /// A quote is usable only with a positive current price.
    pub fn is_valid(&self) -> bool {
        self.current > Decimal::ZERO
    }
}

/// A listed security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    current_price: Decimal,
    previous_close: Decimal,
    change_amount: Option<Decimal>,
    change_percent: Option<Decimal>,
    pub open_price: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub sector: String,
    pub industry: String,
    pub description: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Instrument {
    /// Create an instrument; change fields are derived immediately.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
        previous_close: Decimal,
        sector: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        let mut instrument = Self {
            symbol: symbol.into(),
            name: name.into(),
            current_price,
            previous_close,
            change_amount: None,
            change_percent: None,
            open_price: None,
            day_high: None,
            day_low: None,
            sector: sector.into(),
            industry: industry.into(),
            description: None,
            last_updated: Utc::now(),
        };
        instrument.recompute_change();
        instrument
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn current_price(&self) -> Decimal {
        self.current_price
    }

    pub fn previous_close(&self) -> Decimal {
        self.previous_close
    }

    /// `current - previous`, defined only when previous close is positive.
    pub fn change_amount(&self) -> Option<Decimal> {
        self.change_amount
    }

    /// `change / previous * 100` rounded to four places half-up.
    pub fn change_percent(&self) -> Option<Decimal> {
        self.change_percent
    }

    pub fn set_current_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.last_updated = Utc::now();
        self.recompute_change();
    }

    pub fn set_previous_close(&mut self, price: Decimal) {
        self.previous_close = price;
        self.last_updated = Utc::now();
        self.recompute_change();
    }

    /// Apply a quote. Returns false, leaving the instrument untouched, if the
    /// quote has no positive price.
    pub fn apply_quote(&mut self, quote: &Quote) -> bool {
        if !quote.is_valid() {
            return false;
        }

        self.previous_close = quote.previous_close;
        self.current_price = quote.current;
        if quote.open.is_some() {
            self.open_price = quote.open;
        }
        if quote.high.is_some() {
            self.day_high = quote.high;
        }
        if quote.low.is_some() {
            self.day_low = quote.low;
        }
        self.last_updated = quote.timestamp;
        self.recompute_change();
        true
    }

    pub fn is_positive_change(&self) -> bool {
        self.change_amount.map(|c| c > Decimal::ZERO).unwrap_or(false)
    }

    pub fn is_negative_change(&self) -> bool {
        self.change_amount.map(|c| c < Decimal::ZERO).unwrap_or(false)
    }

    fn recompute_change(&mut self) {
        if self.previous_close > Decimal::ZERO {
            let change = self.current_price - self.previous_close;
            self.change_amount = Some(change);
            self.change_percent = Some(round_half_up(
                change / self.previous_close * Decimal::ONE_HUNDRED,
                CHANGE_PERCENT_SCALE,
            ));
        } else {
            self.change_amount = None;
            self.change_percent = None;
        }
    }
}
