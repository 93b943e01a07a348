//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10,2)` and always carry exactly two decimal
//! places. Totals are computed with [`Price::times`] and plain `Decimal`
//! addition, never floats.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// Below the minimum price of 0.01.
    #[error("price must be at least 0.01")]
    TooLow,
    /// Does not fit the `NUMERIC(10,2)` column.
    #[error("price must be at most 99999999.99")]
    TooHigh,
}

/// Currency symbol used when displaying amounts.
pub const CURRENCY_SYMBOL: &str = "¥";

/// A positive product price with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Smallest accepted price.
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
    /// Largest value that fits `NUMERIC(10,2)`.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    /// Create a price, rounding half away from zero to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLow`] or [`PriceError::TooHigh`] when the
    /// rounded amount is out of range.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded < Self::MIN {
            return Err(PriceError::TooLow);
        }
        if rounded > Self::MAX {
            return Err(PriceError::TooHigh);
        }
        Ok(Self(rounded))
    }

    /// Parse a price from form input such as `"19.9"` or `" 5 "`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for non-numeric input, otherwise the
    /// range errors of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Wrap a value read from the database without re-validating it.
    #[must_use]
    pub const fn from_db(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

/// Format any amount the way prices are shown to shoppers (`¥12.50`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{:.2}", amount)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
