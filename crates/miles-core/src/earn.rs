//! # Earn Calculator
//!
//! Computes the Miles a completed booking earns.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Booking ₺1,000.50, Gold tier, first booking                           │
//! │                                                                         │
//! │  base_miles   = floor(1000.50)                 = 1000                  │
//! │  first bonus  = +500 (flat, never multiplied)  =  500                  │
//! │  tier bonus   = floor(1000 × (1.25 − 1))       =  250                  │
//! │                                                 ─────                  │
//! │  total_miles                                   = 1750                  │
//! │                                                                         │
//! │  bonus_reasons = ["First booking bonus: +500 Miles",                   │
//! │                   "Gold tier bonus: +250 Miles"]                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::tier::Tier;

/// Flat bonus for a user's first completed booking.
pub const FIRST_BOOKING_BONUS: i64 = 500;

/// Result of the earn calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MilesEarned {
    pub base_miles: i64,
    pub bonus_miles: i64,
    pub total_miles: i64,
    /// First-booking reason (if any) always precedes the tier reason.
    pub bonus_reasons: Vec<String>,
}

/// Computes Miles earned for a booking.
///
/// ## Rules
/// - 1 lira = 1 Mile, floored: ₺99.99 earns 99 base Miles.
/// - First booking adds a flat [`FIRST_BOOKING_BONUS`].
/// - The tier multiplier applies to `base_miles` only, never to the
///   first-booking bonus.
///
/// ## Precondition
/// `booking_amount > 0`; guard with
/// [`validate_booking_amount`](crate::validation::validate_booking_amount).
///
/// ## Example
/// ```rust
/// use miles_core::earn::calculate_miles_earned;
/// use miles_core::money::Money;
/// use miles_core::tier::Tier;
///
/// let earned = calculate_miles_earned(Money::from_lira(1000), Tier::Gold, false);
/// assert_eq!(earned.total_miles, 1250);
/// ```
pub fn calculate_miles_earned(booking_amount: Money, tier: Tier, is_first_booking: bool) -> MilesEarned {
    debug_assert!(booking_amount.is_positive(), "booking amount must be positive");

    let base_miles = booking_amount.whole_units();
    let mut bonus_miles = 0;
    let mut bonus_reasons = Vec::new();

    if is_first_booking {
        bonus_miles += FIRST_BOOKING_BONUS;
        bonus_reasons.push(format!("First booking bonus: +{FIRST_BOOKING_BONUS} Miles"));
    }

    let tier_bonus = tier_bonus_miles(base_miles, tier);
    if tier_bonus > 0 {
        bonus_miles += tier_bonus;
        bonus_reasons.push(format!(
            "{} tier bonus: +{} Miles",
            tier.display_name(),
            tier_bonus
        ));
    }

    MilesEarned {
        base_miles,
        bonus_miles,
        total_miles: base_miles + bonus_miles,
        bonus_reasons,
    }
}

/// `floor(base × (multiplier − 1))` in integer basis points.
fn tier_bonus_miles(base_miles: i64, tier: Tier) -> i64 {
    let extra_bps = tier.earn_multiplier_bps() - 10_000;
    (base_miles as i128 * extra_bps as i128 / 10_000) as i64
}

// =============================================================================
// Unit Tests
// =============================================================================
