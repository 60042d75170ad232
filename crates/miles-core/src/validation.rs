//! # Validation Module
//!
//! Boundary guards for the calculators' preconditions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Booking frontend                                             │
//! │  └── Basic form checks, immediate feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository entry points (miles-db)                           │
//! │  └── THIS MODULE: reject negative amounts, bad ids, bad windows        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pure calculators                                             │
//! │  └── debug_assert! the same preconditions; never re-validate           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite CHECK constraints                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use miles_core::money::Money;
//! use miles_core::validation::{validate_booking_amount, validate_miles_amount};
//!
//! validate_booking_amount(Money::from_lira(1200)).unwrap();
//! assert!(validate_miles_amount(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest look-ahead accepted for the expiring-soon query.
pub const MAX_HORIZON_DAYS: i64 = 3_650;

/// Longest ledger description stored.
pub const MAX_DESCRIPTION_LEN: usize = 200;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a booking amount before the earn or referral calculators run.
///
/// ## Rules
/// - Must be positive (> ₺0.00)
pub fn validate_booking_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "booking amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a Miles amount for any ledger movement.
///
/// ## Rules
/// - Must be positive (> 0); direction is carried by the transaction kind
pub fn validate_miles_amount(miles: i64) -> ValidationResult<()> {
    if miles <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "miles".to_string(),
        });
    }

    Ok(())
}

/// Validates a lifetime Miles total before tier resolution.
pub fn validate_lifetime_miles(miles: i64) -> ValidationResult<()> {
    if miles < 0 {
        return Err(ValidationError::OutOfRange {
            field: "lifetime miles".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the look-ahead window for expiring Miles.
pub fn validate_horizon_days(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_HORIZON_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "horizon days".to_string(),
            min: 1,
            max: MAX_HORIZON_DAYS,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a ledger description.
///
/// ## Returns
/// The trimmed description.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

/// Validates a user id (UUID format).
///
/// ## Example
/// ```rust
/// use miles_core::validation::validate_user_id;
///
/// assert!(validate_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_user_id("not-a-uuid").is_err());
/// ```
pub fn validate_user_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "user_id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
