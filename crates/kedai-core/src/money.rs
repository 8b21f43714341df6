//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Split payment typed by a cashier:                                      │
//! │    "10000.1" + "4999.9" as floats = 14999.999999999998  ❌             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer smallest units                                   │
//! │    Each amount is parsed and rounded to whole units ONCE at input,     │
//! │    then every sum and comparison is exact integer math.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kedai_core::money::Money;
//!
//! let price = Money::from_units(15_000); // Rp 15.000
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.units(), 45_000);
//!
//! let typed = Money::parse_amount("44999.5").unwrap();
//! assert_eq!(typed, Money::from_units(45_000));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (`expected - allocated`) can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Newtype**: serializes as a bare integer
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► SaleUnit.price ──► CartLine.price ──► line total    │
/// │                                                                         │
/// │  Cart.total() ──► PaymentAllocation sum check ──► TransactionRequest   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from smallest currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in smallest currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kedai_core::money::Money;
    ///
    /// let unit_price = Money::from_units(15_000);
    /// assert_eq!(unit_price.multiply_quantity(2).units(), 30_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u64) -> Self {
        Money(self.0 * qty as i64)
    }

    /// Parses an amount typed as decimal text into whole currency units.
    ///
    /// Accepts an optional leading sign, digits, and an optional fractional
    /// part separated by `.` or `,`. The fraction is rounded half away from
    /// zero. Blank input parses as zero, matching an untouched amount field.
    ///
    /// ## Example
    /// ```rust
    /// use kedai_core::money::Money;
    ///
    /// assert_eq!(Money::parse_amount("15000").unwrap().units(), 15_000);
    /// assert_eq!(Money::parse_amount(" 2500.49 ").unwrap().units(), 2_500);
    /// assert_eq!(Money::parse_amount("2500,5").unwrap().units(), 2_501);
    /// assert_eq!(Money::parse_amount("").unwrap().units(), 0);
    /// assert!(Money::parse_amount("12a").is_err());
    /// ```
    pub fn parse_amount(text: &str) -> Result<Money, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Money::zero());
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let (negative, digits) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (whole, fraction) = match digits.find(['.', ',']) {
            Some(pos) => (&digits[..pos], &digits[pos + 1..]),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }

        let mut units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };

        if fraction.as_bytes().first().is_some_and(|d| *d >= b'5') {
            units = units
                .checked_add(1)
                .ok_or_else(|| invalid("amount is too large"))?;
        }

        Ok(Money(if negative { -units } else { units }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays the amount as Indonesian Rupiah with `.` thousands separators.
///
/// ## Note
/// This is for logs and error messages. The frontend owns localized display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<u64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(15_000).to_string(), "Rp 15.000");
        assert_eq!(Money::from_units(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_units(999).to_string(), "Rp 999");
        assert_eq!(Money::from_units(-1).to_string(), "-Rp 1");
        assert_eq!(Money::zero().to_string(), "Rp 0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert_eq!((b - a).units(), -500);
        assert_eq!((a * 3).units(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.units(), 2000);
    }

    #[test]
    fn test_parse_amount_rounding() {
        assert_eq!(Money::parse_amount("10000.4").unwrap().units(), 10_000);
        assert_eq!(Money::parse_amount("10000.5").unwrap().units(), 10_001);
        assert_eq!(Money::parse_amount("-3.5").unwrap().units(), -4);
        assert_eq!(Money::parse_amount(".9").unwrap().units(), 1);
        assert_eq!(Money::parse_amount("+7").unwrap().units(), 7);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(Money::parse_amount("abc").is_err());
        assert!(Money::parse_amount("1.2.3").is_err());
        assert!(Money::parse_amount("-").is_err());
        assert!(Money::parse_amount("99999999999999999999").is_err());
    }

    /// Split amounts that would drift as floats stay exact once parsed.
    #[test]
    fn test_parsed_split_sums_exactly() {
        let parts = ["10000.1", "4999.9"];
        let sum: Money = parts
            .iter()
            .map(|p| Money::parse_amount(p).unwrap())
            .sum();
        assert_eq!(sum, Money::from_units(15_000));
    }
}
