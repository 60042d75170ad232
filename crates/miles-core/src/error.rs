//! # Error Types
//!
//! Domain-specific error types for miles-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  miles-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Boundary input validation failures             │
//! │                                                                         │
//! │  miles-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Redemption rule failures are NOT errors at the calculator level: the
//! validator returns a [`RedemptionCheck`](crate::redemption::RedemptionCheck)
//! value. They only become a [`CoreError`] once a ledger mutation is
//! attempted with a request that failed the rules.

use thiserror::Error;

use crate::redemption::RedemptionError;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
///
/// These represent attempts to move Miles in a way the account cannot
/// support. They should be caught and translated to user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The redemption request failed one of the redemption rules.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: "Pay with 150 Miles"
    ///      │
    ///      ▼
    /// validate_redemption(available=1000, requested=150)
    ///      │
    ///      ▼
    /// RedemptionRejected(NotMultipleOfStep { step: 100 })
    ///      │
    ///      ▼
    /// UI shows: "Miles must be redeemed in multiples of 100"
    /// ```
    #[error("Redemption rejected: {0}")]
    RedemptionRejected(RedemptionError),

    /// Releasing or settling more Miles than are currently on hold.
    #[error("Cannot release {requested} Miles: only {held} on hold")]
    HoldExceeded { held: i64, requested: i64 },

    /// Stored balance does not match the sum of ledger entries.
    #[error("Ledger mismatch for {user_id}: ledger sums to {ledger}, account holds {account}")]
    LedgerMismatch {
        user_id: String,
        ledger: i64,
        account: i64,
    },

    /// `available_miles` drifted from `total_miles - used_miles`.
    #[error("Balance drift for {user_id}: available {available}, total {total}, used {used}")]
    BalanceDrift {
        user_id: String,
        available: i64,
        total: i64,
        used: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised by the boundary validators in [`crate::validation`]
/// before any calculator runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::HoldExceeded {
            held: 200,
            requested: 300,
        };
        assert_eq!(err.to_string(), "Cannot release 300 Miles: only 200 on hold");

        let err = CoreError::RedemptionRejected(RedemptionError::InsufficientBalance);
        assert_eq!(
            err.to_string(),
            "Redemption rejected: Insufficient Miles balance"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "user_id".to_string(),
        };
        assert_eq!(err.to_string(), "user_id is required");

        let err = ValidationError::MustBePositive {
            field: "booking amount".to_string(),
        };
        assert_eq!(err.to_string(), "booking amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "user_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
