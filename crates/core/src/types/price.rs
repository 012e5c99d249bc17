//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error returned for prices that can't be sold at.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    #[error("invalid price: {0:?}")]
    Invalid(String),
}

/// A non-negative unit price in the store currency.
///
/// Serializes as a decimal string (`"12.50"`) in the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a price from user input such as `"12.5"` or `"$12.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a non-negative decimal.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let cleaned = input.trim().trim_start_matches('$').replace(',', "");
        let amount: Decimal = cleaned
            .parse()
            .map_err(|_| PriceError::Invalid(input.to_owned()))?;
        Self::new(amount)
    }

    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity (for cart line totals).
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display (e.g., `$19.99`).
    #[must_use]
    pub fn display(self) -> String {
        format!("${:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
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

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}
