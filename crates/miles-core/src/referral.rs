//! # Referral Bonus Calculator
//!
//! ```text
//! referrer_bonus = referrer tier's referral_bonus (200 / 300 / 500 / 1000)
//! referred_bonus = 500
//! referred booking ≥ ₺5000 → both +200
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::tier::Tier;

/// Flat bonus for the newly referred user.
pub const REFERRED_BONUS: i64 = 500;

/// Booking amount at which both sides get the high-value top-up.
pub const HIGH_VALUE_THRESHOLD: Money = Money::from_lira(5_000);

/// Top-up added to both bonuses for a high-value referred booking.
pub const HIGH_VALUE_TOP_UP: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReferralBonus {
    pub referrer_bonus: i64,
    pub referred_bonus: i64,
}

/// Computes referral bonuses for both sides of a referral.
///
/// ## Example
/// ```rust
/// use miles_core::money::Money;
/// use miles_core::referral::calculate_referral_bonus;
/// use miles_core::tier::Tier;
///
/// let bonus = calculate_referral_bonus(Tier::Silver, Money::from_lira(5_000));
/// assert_eq!((bonus.referrer_bonus, bonus.referred_bonus), (500, 700));
/// ```
pub fn calculate_referral_bonus(referrer_tier: Tier, referred_booking_amount: Money) -> ReferralBonus {
    let mut bonus = ReferralBonus {
        referrer_bonus: referrer_tier.benefit().referral_bonus,
        referred_bonus: REFERRED_BONUS,
    };

    if referred_booking_amount >= HIGH_VALUE_THRESHOLD {
        bonus.referrer_bonus += HIGH_VALUE_TOP_UP;
        bonus.referred_bonus += HIGH_VALUE_TOP_UP;
    }

    bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold() {
        let bonus = calculate_referral_bonus(Tier::Silver, Money::from_lira(4_999));
        assert_eq!(bonus, ReferralBonus { referrer_bonus: 300, referred_bonus: 500 });

        // One kuruş short still misses the top-up.
        let bonus = calculate_referral_bonus(Tier::Silver, Money::from_kurus(499_999));
        assert_eq!(bonus.referred_bonus, 500);
    }

    #[test]
    fn test_high_value_top_up() {
        let bonus = calculate_referral_bonus(Tier::Silver, Money::from_lira(5_000));
        assert_eq!(bonus, ReferralBonus { referrer_bonus: 500, referred_bonus: 700 });

        // Single step, not a sliding scale.
        let bonus = calculate_referral_bonus(Tier::Silver, Money::from_lira(50_000));
        assert_eq!(bonus, ReferralBonus { referrer_bonus: 500, referred_bonus: 700 });
    }

    #[test]
    fn test_referrer_bonus_by_tier() {
        let amount = Money::from_lira(100);
        let bonuses: Vec<i64> = Tier::ALL
            .iter()
            .map(|t| calculate_referral_bonus(*t, amount).referrer_bonus)
            .collect();
        assert_eq!(bonuses, vec![200, 300, 500, 1_000]);
    }
}
