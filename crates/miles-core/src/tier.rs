//! # Tier Module
//!
//! The static tier table and the tier resolver.
//!
//! ## Tier Bands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Tiers by lifetime earned Miles                          │
//! │                                                                         │
//! │   0          1,000          5,000          10,000                       │
//! │   ├────────────┼──────────────┼───────────────┼──────────────────►      │
//! │   │  Standard  │    Silver    │     Gold      │  VIP (terminal)         │
//! │   │   ×1.00    │    ×1.10     │    ×1.25      │   ×1.50                 │
//! │   │  expire 2y │   expire 2y  │   expire 2y   │   never expire          │
//! │                                                                         │
//! │  Only lifetime_earned moves a user between bands. Redemption never     │
//! │  lowers it, so a user never drops a tier by spending Miles.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is a `static` array and every per-tier lookup is an exhaustive
//! `match` on [`Tier`], so adding a tier is a compile error until every rule
//! handles it.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Tier
// =============================================================================

/// Loyalty tier, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Standard,
    Silver,
    Gold,
    Vip,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 4] = [Tier::Standard, Tier::Silver, Tier::Gold, Tier::Vip];

    /// Returns the static benefit row for this tier.
    pub fn benefit(self) -> &'static TierBenefit {
        match self {
            Tier::Standard => &TIER_BENEFITS[0],
            Tier::Silver => &TIER_BENEFITS[1],
            Tier::Gold => &TIER_BENEFITS[2],
            Tier::Vip => &TIER_BENEFITS[3],
        }
    }

    /// Lifetime earned Miles needed to enter this tier.
    pub const fn required_miles(self) -> i64 {
        match self {
            Tier::Standard => 0,
            Tier::Silver => 1_000,
            Tier::Gold => 5_000,
            Tier::Vip => 10_000,
        }
    }

    /// The next tier up, or `None` for VIP.
    pub const fn next(self) -> Option<Tier> {
        match self {
            Tier::Standard => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Vip),
            Tier::Vip => None,
        }
    }

    /// Earn multiplier in basis points (10000 = ×1.0).
    ///
    /// Integer basis points keep `floor(base × (multiplier − 1))` exact.
    pub const fn earn_multiplier_bps(self) -> i64 {
        match self {
            Tier::Standard => 10_000,
            Tier::Silver => 11_000,
            Tier::Gold => 12_500,
            Tier::Vip => 15_000,
        }
    }

    /// Whether Miles earned at this tier never expire.
    pub const fn never_expires(self) -> bool {
        matches!(self, Tier::Vip)
    }

    /// Lowercase name, matching the serialized and stored form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Vip => "vip",
        }
    }

    /// Display name used in bonus reasons.
    pub const fn display_name(self) -> &'static str {
        match self {
            Tier::Standard => "Standard",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Vip => "VIP",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tier Benefit Table
// =============================================================================

/// Static, immutable benefits of a tier.
///
/// `benefits` are display strings only; no rule reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBenefit {
    pub tier: Tier,
    pub required_miles: i64,
    /// Member discount on bookings, whole percent (0–10).
    pub discount_percentage: u8,
    pub birthday_bonus: i64,
    /// Flat bonus paid to a referrer of this tier.
    pub referral_bonus: i64,
    pub benefits: &'static [&'static str],
}

impl TierBenefit {
    /// Applies this tier's member discount to a booking price.
    pub fn member_price(&self, price: crate::money::Money) -> crate::money::Money {
        price.apply_percentage_discount(self.discount_percentage)
    }
}

static TIER_BENEFITS: [TierBenefit; 4] = [
    TierBenefit {
        tier: Tier::Standard,
        required_miles: Tier::Standard.required_miles(),
        discount_percentage: 0,
        birthday_bonus: 100,
        referral_bonus: 200,
        benefits: &["Earn 1 Mile per lira", "Member-only deals"],
    },
    TierBenefit {
        tier: Tier::Silver,
        required_miles: Tier::Silver.required_miles(),
        discount_percentage: 3,
        birthday_bonus: 250,
        referral_bonus: 300,
        benefits: &[
            "10% bonus Miles",
            "3% member discount",
            "Priority customer support",
        ],
    },
    TierBenefit {
        tier: Tier::Gold,
        required_miles: Tier::Gold.required_miles(),
        discount_percentage: 5,
        birthday_bonus: 500,
        referral_bonus: 500,
        benefits: &[
            "25% bonus Miles",
            "5% member discount",
            "Free cancellation on hotels",
            "Late checkout where available",
        ],
    },
    TierBenefit {
        tier: Tier::Vip,
        required_miles: Tier::Vip.required_miles(),
        discount_percentage: 10,
        birthday_bonus: 1_000,
        referral_bonus: 1_000,
        benefits: &[
            "50% bonus Miles",
            "10% member discount",
            "Miles never expire",
            "Free airport transfer",
            "Dedicated travel concierge",
        ],
    },
];

// =============================================================================
// Tier Resolver
// =============================================================================

/// Resolves the tier for a lifetime earned Miles total.
///
/// ## Precondition
/// `lifetime_earned >= 0`. Negative totals are a caller bug; validate with
/// [`validate_lifetime_miles`](crate::validation::validate_lifetime_miles)
/// at the boundary.
///
/// ## Example
/// ```rust
/// use miles_core::tier::{resolve_tier, Tier};
///
/// assert_eq!(resolve_tier(999).tier, Tier::Standard);
/// assert_eq!(resolve_tier(1_000).tier, Tier::Silver);
/// assert_eq!(resolve_tier(10_000).tier, Tier::Vip);
/// ```
pub fn resolve_tier(lifetime_earned: i64) -> &'static TierBenefit {
    debug_assert!(lifetime_earned >= 0, "lifetime_earned must be non-negative");

    let tier = if lifetime_earned >= Tier::Vip.required_miles() {
        Tier::Vip
    } else if lifetime_earned >= Tier::Gold.required_miles() {
        Tier::Gold
    } else if lifetime_earned >= Tier::Silver.required_miles() {
        Tier::Silver
    } else {
        Tier::Standard
    };

    tier.benefit()
}

/// Returns the birthday bonus for a user with the given lifetime earnings.
pub fn birthday_bonus_for(lifetime_earned: i64) -> i64 {
    resolve_tier(lifetime_earned).birthday_bonus
}

// =============================================================================
// Tier Progress
// =============================================================================

/// Where a user stands inside their current tier band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub current_tier: Tier,
    /// `None` only for VIP, the terminal tier.
    pub next_tier: Option<Tier>,
    /// Linear progress through the current band, clamped to 0–100.
    pub progress_percent: f64,
    /// Miles still needed for the next tier; 0 for VIP.
    pub miles_needed: i64,
}

/// Computes progress toward the next tier.
///
/// ```text
/// progress = (lifetime_earned − band_floor) / (band_ceiling − band_floor) × 100
/// ```
///
/// ## Example
/// ```rust
/// use miles_core::tier::{tier_progress, Tier};
///
/// let p = tier_progress(3_000);
/// assert_eq!(p.current_tier, Tier::Silver);
/// assert_eq!(p.next_tier, Some(Tier::Gold));
/// assert_eq!(p.progress_percent, 50.0);
/// assert_eq!(p.miles_needed, 2_000);
/// ```
pub fn tier_progress(lifetime_earned: i64) -> TierProgress {
    let current = resolve_tier(lifetime_earned).tier;

    let Some(next) = current.next() else {
        return TierProgress {
            current_tier: current,
            next_tier: None,
            progress_percent: 100.0,
            miles_needed: 0,
        };
    };

    let floor = current.required_miles();
    let ceiling = next.required_miles();
    let percent = (lifetime_earned - floor) as f64 / (ceiling - floor) as f64 * 100.0;

    TierProgress {
        current_tier: current,
        next_tier: Some(next),
        progress_percent: percent.clamp(0.0, 100.0),
        miles_needed: (ceiling - lifetime_earned).max(0),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(resolve_tier(0).tier, Tier::Standard);
        assert_eq!(resolve_tier(999).tier, Tier::Standard);
        assert_eq!(resolve_tier(1_000).tier, Tier::Silver);
        assert_eq!(resolve_tier(4_999).tier, Tier::Silver);
        assert_eq!(resolve_tier(5_000).tier, Tier::Gold);
        assert_eq!(resolve_tier(9_999).tier, Tier::Gold);
        assert_eq!(resolve_tier(10_000).tier, Tier::Vip);
        assert_eq!(resolve_tier(i64::MAX).tier, Tier::Vip);
    }

    #[test]
    fn test_tier_monotonicity() {
        let samples = [0, 1, 500, 999, 1_000, 2_500, 4_999, 5_000, 7_500, 9_999, 10_000, 50_000];
        for a in samples {
            for b in samples.iter().copied().filter(|b| *b >= a) {
                assert!(
                    resolve_tier(a).required_miles <= resolve_tier(b).required_miles,
                    "tier({a}) > tier({b})"
                );
            }
        }
    }

    #[test]
    fn test_table_is_ordered_and_matches_enum() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].benefit().required_miles < pair[1].benefit().required_miles);
        }
        for tier in Tier::ALL {
            assert_eq!(tier.benefit().tier, tier);
            assert!(tier.benefit().discount_percentage <= 10);
        }
    }

    #[test]
    fn test_referral_bonuses_per_tier() {
        let bonuses: Vec<i64> = Tier::ALL.iter().map(|t| t.benefit().referral_bonus).collect();
        assert_eq!(bonuses, vec![200, 300, 500, 1_000]);
    }

    #[test]
    fn test_progress_within_band() {
        let p = tier_progress(0);
        assert_eq!(p.current_tier, Tier::Standard);
        assert_eq!(p.next_tier, Some(Tier::Silver));
        assert_eq!(p.progress_percent, 0.0);
        assert_eq!(p.miles_needed, 1_000);

        let p = tier_progress(7_500);
        assert_eq!(p.current_tier, Tier::Gold);
        assert_eq!(p.progress_percent, 50.0);
        assert_eq!(p.miles_needed, 2_500);
    }

    #[test]
    fn test_progress_vip_is_terminal() {
        let p = tier_progress(10_000);
        assert_eq!(p.current_tier, Tier::Vip);
        assert_eq!(p.next_tier, None);
        assert_eq!(p.progress_percent, 100.0);
        assert_eq!(p.miles_needed, 0);
    }

    #[test]
    fn test_progress_bounds() {
        for earned in (0..12_000).step_by(37) {
            let p = tier_progress(earned);
            assert!((0.0..=100.0).contains(&p.progress_percent), "{earned}");
            assert!(p.miles_needed >= 0);
        }
    }

    #[test]
    fn test_birthday_bonus_follows_tier() {
        assert_eq!(birthday_bonus_for(0), 100);
        assert_eq!(birthday_bonus_for(12_000), 1_000);
    }

    #[test]
    fn test_member_price() {
        let price = crate::money::Money::from_lira(1_000);
        assert_eq!(Tier::Standard.benefit().member_price(price), price);
        assert_eq!(Tier::Vip.benefit().member_price(price).kurus(), 90_000);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Vip).unwrap(), "\"vip\"");
        assert_eq!(Tier::Gold.to_string(), "gold");
    }

    #[test]
    fn test_new_members_default_to_standard() {
        assert_eq!(Tier::default(), Tier::Standard);
        assert_eq!(resolve_tier(0).tier, Tier::default());
    }
}
