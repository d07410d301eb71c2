//! Money type for representing monetary values.
//!
//! Amounts are stored as whole cents in an unsigned integer, so a price or a
//! cart total can never go negative and never accumulates floating-point
//! drift. The storefront sells in a single currency (US dollars).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommerceError;

/// Currency symbol used for every displayed amount.
pub const CURRENCY_SYMBOL: &str = "$";

/// Largest amount accepted from a decimal value.
///
/// Every integer number of cents up to 2^53 is exactly representable as an
/// `f64`, so parsed prices never silently lose precision.
pub const MAX_AMOUNT_CENTS: u64 = 1 << 53;

/// A non-negative monetary value in cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money {
    amount_cents: u64,
}

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money { amount_cents: 0 };

    /// Create a new Money value from cents.
    pub const fn new(amount_cents: u64) -> Self {
        Self { amount_cents }
    }

    /// Create a Money value from a decimal amount, rounding to the nearest cent.
    ///
    /// ```
    /// use boutique_commerce::money::Money;
    /// let price = Money::from_decimal(49.99).unwrap();
    /// assert_eq!(price.amount_cents(), 4999);
    /// ```
    pub fn from_decimal(amount: f64) -> Result<Self, CommerceError> {
        let invalid = |reason| CommerceError::InvalidPrice {
            input: amount.to_string(),
            reason,
        };

        if !amount.is_finite() {
            return Err(invalid("not a finite number"));
        }
        if amount < 0.0 {
            return Err(invalid("negative"));
        }

        let cents = (amount * 100.0).round();
        if cents > MAX_AMOUNT_CENTS as f64 {
            return Err(invalid("too large"));
        }

        Ok(Self::new(cents as u64))
    }

    /// Parse a decimal price string such as `"45.00"`.
    ///
    /// The whole string (surrounding whitespace aside) must be a number;
    /// trailing garbage, `NaN`, infinities and negative values are rejected.
    pub fn parse(input: &str) -> Result<Self, CommerceError> {
        let trimmed = input.trim();
        let amount: f64 = trimmed.parse().map_err(|_| CommerceError::InvalidPrice {
            input: input.to_string(),
            reason: "not a decimal number",
        })?;

        Self::from_decimal(amount).map_err(|e| match e {
            CommerceError::InvalidPrice { reason, .. } => CommerceError::InvalidPrice {
                input: input.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Amount in cents.
    pub const fn amount_cents(&self) -> u64 {
        self.amount_cents
    }

    /// Check if this is zero.
    pub const fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Convert to a decimal value.
    pub fn to_decimal(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }

    /// Format with symbol and two decimals (e.g., "$49.99").
    pub fn display(&self) -> String {
        format!("{}{}", CURRENCY_SYMBOL, self.display_amount())
    }

    /// Format without symbol (e.g., "49.99").
    pub fn display_amount(&self) -> String {
        format!("{}.{:02}", self.amount_cents / 100, self.amount_cents % 100)
    }

    /// Add another amount, returning None on overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        self.amount_cents.checked_add(other.amount_cents).map(Money::new)
    }

    /// Subtract another amount, returning None if the result would be negative.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        self.amount_cents.checked_sub(other.amount_cents).map(Money::new)
    }

    /// Sum an iterator of amounts, returning None on overflow.
    pub fn try_sum<'a>(iter: impl IntoIterator<Item = &'a Money>) -> Option<Money> {
        iter.into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.try_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
