//! # Domain Types
//!
//! The account and ledger shapes shared with the persistence layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐  1     *  ┌──────────────────────┐           │
//! │  │  UserMilesAccount    │──────────►│  MilesTransaction    │           │
//! │  │  ──────────────────  │           │  ──────────────────  │           │
//! │  │  user_id             │           │  id (UUID)           │           │
//! │  │  total_miles         │           │  kind                │           │
//! │  │  available_miles     │           │  amount (> 0)        │           │
//! │  │  used_miles (held)   │           │  balance_after       │           │
//! │  │  lifetime_earned     │           │  expiry_date?        │           │
//! │  │  lifetime_spent      │           │  source_id?          │           │
//! │  │  tier (derived)      │           └──────────────────────┘           │
//! │  └──────────────────────┘                                              │
//! │                                                                         │
//! │  TierBenefit is referenced by value through Tier; accounts never hold  │
//! │  a key to a mutable tier row.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Balance Model
//! - `total_miles` is the ledger balance: credits minus debits.
//! - `used_miles` is what open checkouts currently hold.
//! - `available_miles = total_miles - used_miles` is what a new request
//!   can spend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::tier::Tier;

// =============================================================================
// Transaction Kind
// =============================================================================

/// What a ledger entry does to the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Miles earned from a booking.
    Earn,
    /// Miles spent on a booking.
    Redeem,
    /// Miles removed because they passed their expiry date.
    Expire,
    /// Promotional credit: referral, birthday, first booking campaigns.
    Bonus,
    /// Redeemed Miles returned after a cancellation.
    Refund,
}

impl TransactionKind {
    /// +1 for credits, -1 for debits.
    pub const fn sign(self) -> i64 {
        match self {
            TransactionKind::Earn | TransactionKind::Bonus | TransactionKind::Refund => 1,
            TransactionKind::Redeem | TransactionKind::Expire => -1,
        }
    }

    /// Whether entries of this kind can carry an expiry date.
    pub const fn can_expire(self) -> bool {
        matches!(self, TransactionKind::Earn | TransactionKind::Bonus)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Redeem => "redeem",
            TransactionKind::Expire => "expire",
            TransactionKind::Bonus => "bonus",
            TransactionKind::Refund => "refund",
        }
    }
}

// =============================================================================
// Miles Transaction
// =============================================================================

/// Immutable ledger entry.
///
/// `amount` is always positive; `kind` carries the direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MilesTransaction {
    pub id: String,
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    /// `total_miles` right after this entry was applied.
    pub balance_after: i64,
    pub description: String,
    /// Booking that produced or consumed these Miles.
    pub booking_id: Option<String>,
    /// For `expire` entries: the earn/bonus entry being expired.
    pub source_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// `None` means the Miles never expire (VIP).
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl MilesTransaction {
    /// Amount with its balance direction applied.
    #[inline]
    pub fn signed_amount(&self) -> i64 {
        self.kind.sign() * self.amount
    }
}

// =============================================================================
// User Miles Account
// =============================================================================

/// One loyalty account per user.
///
/// Mutate only through the ledger methods in [`crate::ledger`]; they keep
/// `available_miles` and `tier` derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserMilesAccount {
    pub user_id: String,
    pub total_miles: i64,
    pub available_miles: i64,
    pub used_miles: i64,
    /// Never decreases. Sole input to tier resolution.
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    /// Cached from `lifetime_earned`; not authoritative.
    pub tier: Tier,
    /// Expiry of the most recently earned batch; `None` for VIP or a fresh
    /// account.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every persisted change.
    pub version: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_signs() {
        assert_eq!(TransactionKind::Earn.sign(), 1);
        assert_eq!(TransactionKind::Bonus.sign(), 1);
        assert_eq!(TransactionKind::Refund.sign(), 1);
        assert_eq!(TransactionKind::Redeem.sign(), -1);
        assert_eq!(TransactionKind::Expire.sign(), -1);
    }

    #[test]
    fn test_only_credits_from_earning_expire() {
        assert!(TransactionKind::Earn.can_expire());
        assert!(TransactionKind::Bonus.can_expire());
        assert!(!TransactionKind::Refund.can_expire());
        assert!(!TransactionKind::Redeem.can_expire());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TransactionKind::Redeem).unwrap(), "\"redeem\"");
        assert_eq!(TransactionKind::Expire.as_str(), "expire");
    }
}
