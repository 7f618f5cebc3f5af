//! Exact money amounts.
//!
//! Prices are held as `rust_decimal::Decimal` so that line totals and cart
//! totals are exact (`9.99 × 2 == 19.98`). On the wire they are plain JSON
//! numbers, which is what API clients already consume.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative money amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a decimal number")]
    NotANumber,
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The input has more than two decimal places.
    #[error("price cannot have more than two decimal places")]
    TooPrecise,
    /// The input is above [`Price::MAX_LISTED`].
    #[error("price cannot exceed {}", Price::MAX_LISTED)]
    TooLarge,
}

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest price a product can be listed at. Matches the catalog's
    /// `NUMERIC(12, 2)` column.
    pub const MAX_LISTED: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Parse a price from user input such as `"9.99"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number, is negative, has
    /// fractional cents or is above [`Self::MAX_LISTED`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        let price = Self::new(amount)?;
        if price.0.scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if price > Self::MAX_LISTED {
            return Err(PriceError::TooLarge);
        }
        Ok(price)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self((self.0 * Decimal::from(quantity)).normalize())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self((self.0 + rhs.0).normalize())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
