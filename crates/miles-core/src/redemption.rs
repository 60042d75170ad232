//! # Redemption Validator
//!
//! Decides whether a Miles redemption request is permissible.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_redemption(available, requested, minimum)                    │
//! │       │                                                                 │
//! │       ├── requested < minimum?      → BelowMinimum                     │
//! │       │                                                                 │
//! │       ├── requested > available?    → InsufficientBalance              │
//! │       │                                                                 │
//! │       ├── requested % 100 != 0?     → NotMultipleOfStep                │
//! │       │                                                                 │
//! │       └── valid                                                         │
//! │                                                                         │
//! │  First failing rule wins. 50 Miles is reported as BelowMinimum even    │
//! │  though it is also not a multiple of 100.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Default smallest redeemable amount.
pub const DEFAULT_MINIMUM_MILES: i64 = 100;

/// Redemption granularity. Business rule, configurable through
/// [`RedemptionPolicy::step_miles`].
pub const DEFAULT_STEP_MILES: i64 = 100;

/// Why a redemption request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RedemptionError {
    #[error("Minimum {minimum} Miles required for redemption")]
    BelowMinimum { minimum: i64 },

    #[error("Insufficient Miles balance")]
    InsufficientBalance,

    #[error("Miles must be redeemed in multiples of {step}")]
    NotMultipleOfStep { step: i64 },
}

/// Outcome of a redemption check.
///
/// Callers must look at `valid` before debiting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RedemptionCheck {
    pub valid: bool,
    pub error: Option<RedemptionError>,
}

impl RedemptionCheck {
    fn ok() -> Self {
        RedemptionCheck {
            valid: true,
            error: None,
        }
    }

    fn rejected(error: RedemptionError) -> Self {
        RedemptionCheck {
            valid: false,
            error: Some(error),
        }
    }

    /// Converts the check into a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<(), RedemptionError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Configurable redemption rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionPolicy {
    pub minimum_miles: i64,
    pub step_miles: i64,
}

impl Default for RedemptionPolicy {
    fn default() -> Self {
        RedemptionPolicy {
            minimum_miles: DEFAULT_MINIMUM_MILES,
            step_miles: DEFAULT_STEP_MILES,
        }
    }
}

impl RedemptionPolicy {
    /// Checks a request against this policy, in rule order.
    pub fn check(&self, available_miles: i64, requested_miles: i64) -> RedemptionCheck {
        if requested_miles < self.minimum_miles {
            return RedemptionCheck::rejected(RedemptionError::BelowMinimum {
                minimum: self.minimum_miles,
            });
        }

        if requested_miles > available_miles {
            return RedemptionCheck::rejected(RedemptionError::InsufficientBalance);
        }

        if self.step_miles > 0 && requested_miles % self.step_miles != 0 {
            return RedemptionCheck::rejected(RedemptionError::NotMultipleOfStep {
                step: self.step_miles,
            });
        }

        RedemptionCheck::ok()
    }
}

/// Validates a redemption request with the default step of 100.
///
/// ## Example
/// ```rust
/// use miles_core::redemption::{validate_redemption, RedemptionError};
///
/// assert!(validate_redemption(1_000, 100, 100).valid);
/// assert_eq!(
///     validate_redemption(1_000, 150, 100).error,
///     Some(RedemptionError::NotMultipleOfStep { step: 100 })
/// );
/// ```
pub fn validate_redemption(available_miles: i64, requested_miles: i64, minimum_miles: i64) -> RedemptionCheck {
    RedemptionPolicy {
        minimum_miles,
        ..RedemptionPolicy::default()
    }
    .check(available_miles, requested_miles)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let check = validate_redemption(1_000, 100, DEFAULT_MINIMUM_MILES);
        assert!(check.valid);
        assert_eq!(check.error, None);
        assert!(check.into_result().is_ok());

        assert!(validate_redemption(1_000, 1_000, DEFAULT_MINIMUM_MILES).valid);
    }

    #[test]
    fn test_below_minimum_wins_over_other_rules() {
        // Below minimum, above balance, and not a multiple of 100 all at once.
        let check = validate_redemption(50, 50, 100);
        assert!(!check.valid);
        assert_eq!(check.error, Some(RedemptionError::BelowMinimum { minimum: 100 }));

        let check = validate_redemption(0, 75, 100);
        assert_eq!(check.error, Some(RedemptionError::BelowMinimum { minimum: 100 }));
    }

    #[test]
    fn test_insufficient_wins_over_step() {
        let check = validate_redemption(200, 250, 100);
        assert_eq!(check.error, Some(RedemptionError::InsufficientBalance));
    }

    #[test]
    fn test_multiple_of_hundred() {
        let check = validate_redemption(1_000, 150, 100);
        assert!(!check.valid);
        assert_eq!(check.error, Some(RedemptionError::NotMultipleOfStep { step: 100 }));
    }

    #[test]
    fn test_custom_policy() {
        let policy = RedemptionPolicy {
            minimum_miles: 500,
            step_miles: 250,
        };
        assert!(policy.check(1_000, 750).valid);
        assert_eq!(
            policy.check(1_000, 600).error,
            Some(RedemptionError::NotMultipleOfStep { step: 250 })
        );
        assert_eq!(
            policy.check(1_000, 250).error,
            Some(RedemptionError::BelowMinimum { minimum: 500 })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RedemptionError::BelowMinimum { minimum: 100 }.to_string(),
            "Minimum 100 Miles required for redemption"
        );
        assert_eq!(
            RedemptionError::NotMultipleOfStep { step: 100 }.to_string(),
            "Miles must be redeemed in multiples of 100"
        );
    }

    #[test]
    fn test_check_serialization() {
        let json = serde_json::to_value(validate_redemption(1_000, 150, 100)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"]["code"], "not_multiple_of_step");
    }
}
