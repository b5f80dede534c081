//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend sends prices as JSON numbers:  "price": 109.95             │
//! │  Summed as floats:  109.95 * 3 = 329.84999999999997  ❌                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "109.95" ──► parse_decimal ──► 10995 cents                           │
//! │    10995 * 3 = 32985 cents = $329.85                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`decimal`] serde adapter converts between the backend's decimal
//! representation (number or numeric string) and cents.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//!
//! let price = Money::parse_decimal("109.95").unwrap();
//! assert_eq!(price.cents(), 10995);
//! assert_eq!((price * 3).to_string(), "$329.85");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: the backend never sends negative prices, but
///   `parse_decimal` still accepts a leading minus
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Saturating arithmetic**: totals over backend quantities stop at the
///   i64 bounds instead of overflowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit part (truncated toward zero).
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents part (0-99, always positive).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total for `qty` units at this price, saturating at the i64 bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Value in whole units as a float, for the wire only.
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses a decimal amount such as `"50"`, `"109.95"` or `"-3.5"`.
    ///
    /// ## Rounding
    /// Digits past the second decimal place are rounded half away from zero:
    /// `"0.125"` becomes 13 cents.
    pub fn parse_decimal(input: &str) -> CoreResult<Money> {
        let raw = input.trim();
        let invalid = |reason: &str| CoreError::InvalidMoney {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty amount"));
        }

        // Exponent notation only comes from serde_json for very large/small
        // numbers; fall back to float parsing for those.
        if raw.contains(['e', 'E']) {
            let value: f64 = raw.parse().map_err(|_| invalid("not a number"))?;
            if !value.is_finite() {
                return Err(invalid("not a finite number"));
            }
            return Ok(Money((value * 100.0).round() as i64));
        }

        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };

        let mut parts = unsigned.splitn(2, '.');
        let major_str = parts.next().unwrap_or_default();
        let minor_str = parts.next().unwrap_or_default();

        if major_str.is_empty() && minor_str.is_empty() {
            return Err(invalid("no digits"));
        }
        if !major_str.chars().all(|c| c.is_ascii_digit())
            || !minor_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a number"));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| invalid("amount too large"))?
        };

        let mut digits = minor_str.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter for prices on the wire.
///
/// Serializes as a JSON number in whole units (`50.0`) and accepts either a
/// JSON number or a numeric string when deserializing.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use shopfront_core::money::{self, Money};
///
/// #[derive(Serialize, Deserialize)]
/// struct Priced {
///     #[serde(with = "money::decimal")]
///     price: Money,
/// }
///
/// let p: Priced = serde_json::from_str(r#"{"price":"12.50"}"#).unwrap();
/// assert_eq!(p.price.cents(), 1250);
/// ```
pub mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Money;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(serde_json::Number),
        Text(String),
    }

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.as_major_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s,
        };
        Money::parse_decimal(&text).map_err(de::Error::custom)
    }

    /// Same as the parent module for `Option<Money>` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::Money;

        pub fn serialize<S: Serializer>(
            money: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match money {
                Some(m) => serializer.serialize_some(&m.as_major_f64()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] Money);

            Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(m)| m))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
