//! # Money Module
//!
//! Provides the `Money` type for booking amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    Math.floor(0.29 * 100) = 28  ❌ WRONG!                               │
//! │                                                                         │
//! │  Miles are earned at 1 Mile per whole lira, floored. A float that      │
//! │  lands a hair under the true value silently costs the customer a Mile. │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Kuruş                                            │
//! │    ₺99.99 is stored as 9999 kuruş                                      │
//! │    whole_units() = 9999 / 100 = 99 Miles, exactly                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use miles_core::money::Money;
//!
//! // Create from kuruş (preferred)
//! let price = Money::from_kurus(1099); // ₺10.99
//!
//! // Parse a checkout amount without going through f64
//! let amount = Money::from_decimal_str("99.99").unwrap();
//! assert_eq!(amount.whole_units(), 99);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of kuruş in one lira.
const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in kuruş (1/100 Turkish lira).
///
/// Booking amounts are non-negative by the time they reach the engine;
/// [`Money::from_decimal_str`] rejects a leading minus sign.
///
/// ## Where Money is Used
/// ```text
/// Booking total ──► calculate_miles_earned ──► base_miles = whole lira
///               │
///               └─► calculate_referral_bonus ──► high-value check (₺5000)
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from kuruş (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use miles_core::money::Money;
    ///
    /// let price = Money::from_kurus(1099); // Represents ₺10.99
    /// assert_eq!(price.kurus(), 1099);
    /// ```
    #[inline]
    pub const fn from_kurus(kurus: i64) -> Self {
        Money(kurus)
    }

    /// Creates a Money value from whole lira.
    ///
    /// ## Example
    /// ```rust
    /// use miles_core::money::Money;
    ///
    /// assert_eq!(Money::from_lira(5000).kurus(), 500_000);
    /// ```
    #[inline]
    pub const fn from_lira(lira: i64) -> Self {
        Money(lira * MINOR_PER_MAJOR)
    }

    /// Creates a Money value from lira and kuruş, e.g. `(99, 99)` for ₺99.99.
    #[inline]
    pub const fn from_lira_kurus(lira: i64, kurus: i64) -> Self {
        Money(lira * MINOR_PER_MAJOR + kurus)
    }

    /// Parses a decimal amount such as `"1250"`, `"99.99"` or `"12,5"`.
    ///
    /// Both `.` and `,` are accepted as the decimal separator since checkout
    /// forms on the Turkish site submit either. At most two fraction digits
    /// are allowed and negative amounts are rejected.
    ///
    /// ## Example
    /// ```rust
    /// use miles_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal_str("99.99").unwrap().kurus(), 9999);
    /// assert_eq!(Money::from_decimal_str("12,5").unwrap().kurus(), 1250);
    /// assert!(Money::from_decimal_str("1.234").is_err());
    /// ```
    pub fn from_decimal_str(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (whole, fraction) = match input.find(['.', ',']) {
            Some(idx) => (&input[..idx], &input[idx + 1..]),
            None => (input, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a non-negative decimal number"));
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let lira: i64 = whole.parse().map_err(|_| invalid("amount is too large"))?;
        let kurus: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("bad fraction"))?,
        };

        lira.checked_mul(MINOR_PER_MAJOR)
            .and_then(|v| v.checked_add(kurus))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }

    /// Returns the value in kuruş (smallest currency unit).
    #[inline]
    pub const fn kurus(&self) -> i64 {
        self.0
    }

    /// Returns the lira portion, truncated toward zero.
    #[inline]
    pub const fn lira(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the kuruş portion (always 0-99).
    #[inline]
    pub const fn kurus_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns the number of whole lira, rounded toward negative infinity.
    ///
    /// This is the `floor(amount)` the earn calculator uses: fractional
    /// currency never yields a Mile.
    ///
    /// ## Example
    /// ```rust
    /// use miles_core::money::Money;
    ///
    /// assert_eq!(Money::from_kurus(9999).whole_units(), 99);
    /// assert_eq!(Money::from_kurus(10000).whole_units(), 100);
    /// ```
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0.div_euclid(MINOR_PER_MAJOR)
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Applies a whole-percent discount and returns the discounted amount.
    ///
    /// The discount itself is rounded half up to the nearest kuruş.
    ///
    /// ## Example
    /// ```rust
    /// use miles_core::money::Money;
    ///
    /// let price = Money::from_lira(1000);
    /// assert_eq!(price.apply_percentage_discount(5).kurus(), 95_000);
    /// ```
    pub fn apply_percentage_discount(&self, percent: u8) -> Money {
        let discount = (self.0 as i128 * percent as i128 + 50) / 100;
        Money::from_kurus(self.0 - discount as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display; the frontend does its own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₺{}.{:02}", sign, self.lira().abs(), self.kurus_part())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kurus() {
        let money = Money::from_kurus(1099);
        assert_eq!(money.kurus(), 1099);
        assert_eq!(money.lira(), 10);
        assert_eq!(money.kurus_part(), 99);
    }

    #[test]
    fn test_from_lira_kurus() {
        assert_eq!(Money::from_lira_kurus(10, 99).kurus(), 1099);
        assert_eq!(Money::from_lira_kurus(0, 5).kurus(), 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_kurus(1099)), "₺10.99");
        assert_eq!(format!("{}", Money::from_kurus(500)), "₺5.00");
        assert_eq!(format!("{}", Money::from_kurus(-550)), "-₺5.50");
        assert_eq!(format!("{}", Money::zero()), "₺0.00");
    }

    #[test]
    fn test_whole_units_floors() {
        assert_eq!(Money::from_kurus(9999).whole_units(), 99);
        assert_eq!(Money::from_kurus(1).whole_units(), 0);
        assert_eq!(Money::from_lira(1000).whole_units(), 1000);
    }

    #[test]
    fn test_from_decimal_str() {
        assert_eq!(Money::from_decimal_str("1000").unwrap(), Money::from_lira(1000));
        assert_eq!(Money::from_decimal_str("99.99").unwrap().kurus(), 9999);
        assert_eq!(Money::from_decimal_str(" 12.5 ").unwrap().kurus(), 1250);
        assert_eq!(Money::from_decimal_str("0,05").unwrap().kurus(), 5);

        assert!(matches!(
            Money::from_decimal_str(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(Money::from_decimal_str("-10").is_err());
        assert!(Money::from_decimal_str("abc").is_err());
        assert!(Money::from_decimal_str("1.234").is_err());
        assert!(Money::from_decimal_str(".50").is_err());
        assert!(Money::from_decimal_str("99999999999999999999").is_err());
    }

    #[test]
    fn test_percentage_discount() {
        let price = Money::from_lira(100);
        assert_eq!(price.apply_percentage_discount(10).kurus(), 9000);
        assert_eq!(price.apply_percentage_discount(0), price);
        // ₺0.15 at 3% = 0.45 kuruş → rounds to 0
        assert_eq!(Money::from_kurus(15).apply_percentage_discount(3).kurus(), 15);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::default().is_zero());
        assert!(Money::from_kurus(1).is_positive());
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_kurus(1099)).unwrap();
        assert_eq!(json, "1099");
    }
}
