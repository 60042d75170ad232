//! # miles-core: Pure Miles Loyalty Accounting
//!
//! This crate holds every rule of the Miles loyalty program as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Miles Loyalty Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Callers (booking completion, checkout, dashboard)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    miles-db (SQLite ledger)                     │   │
//! │  │    read account ──► call core ──► write account + transaction   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ miles-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌────────┐ ┌────────────┐ ┌────────┐ ┌──────────┐ │   │
//! │  │   │  tier  │ │  earn  │ │ redemption │ │ expiry │ │ referral │ │   │
//! │  │   └────────┘ └────────┘ └────────────┘ └────────┘ └──────────┘ │   │
//! │  │   ┌────────┐ ┌────────┐ ┌────────────┐                          │   │
//! │  │   │ types  │ │ ledger │ │ validation │                          │   │
//! │  │   └────────┘ └────────┘ └────────────┘                          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`tier`] - Tier table, resolver and progress
//! - [`earn`] - Miles earned from a booking
//! - [`redemption`] - Redemption rules
//! - [`expiry`] - Expiry dates and expiring-soon aggregate
//! - [`referral`] - Referral bonuses
//! - [`types`] - Account and ledger entry types
//! - [`ledger`] - Balance bookkeeping on accounts
//! - [`money`] - Integer kuruş money type
//! - [`validation`] - Boundary precondition checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; time is passed in as `now`
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money and Miles**: no floats in anything that is floored
//! 4. **Closed Tier Enum**: every tier rule is an exhaustive `match`
//!
//! ## Example Usage
//!
//! ```rust
//! use miles_core::earn::calculate_miles_earned;
//! use miles_core::money::Money;
//! use miles_core::tier::resolve_tier;
//!
//! let tier = resolve_tier(6_200).tier; // Gold
//! let earned = calculate_miles_earned(Money::from_lira(1000), tier, false);
//!
//! assert_eq!(earned.total_miles, 1250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod earn;
pub mod error;
pub mod expiry;
pub mod ledger;
pub mod money;
pub mod redemption;
pub mod referral;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use earn::{calculate_miles_earned, MilesEarned};
pub use error::{CoreError, CoreResult, ValidationError};
pub use expiry::{
    calculate_expiry, due_for_expiry, get_expiring_miles, unspent_expiring_miles, ExpiringMiles, ExpiryDue,
};
pub use ledger::{ledger_balance, verify_ledger};
pub use money::Money;
pub use redemption::{validate_redemption, RedemptionCheck, RedemptionError, RedemptionPolicy};
pub use referral::{calculate_referral_bonus, ReferralBonus};
pub use tier::{resolve_tier, tier_progress, Tier, TierBenefit, TierProgress};
pub use types::*;
