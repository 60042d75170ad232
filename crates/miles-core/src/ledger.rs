//! # Ledger Module
//!
//! Pure bookkeeping on [`UserMilesAccount`]. Every balance change produces
//! the [`MilesTransaction`] that records it, so the persistence layer only
//! has to write both rows in one database transaction.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operation      total   used   lifetime_earned  lifetime_spent  entry   │
//! │  ─────────────  ─────   ────   ───────────────  ──────────────  ──────  │
//! │  earn           +a             +a                               earn    │
//! │  award_bonus    +a             +a                               bonus   │
//! │  redeem         −a                              +a              redeem  │
//! │  hold                   +a                                      —       │
//! │  release_hold           −a                                      —       │
//! │  settle_hold    −a      −a                      +a              redeem  │
//! │  expire         −a                                              expire  │
//! │  refund         +a                              −a (floor 0)    refund  │
//! │                                                                         │
//! │  After every row: available = total − used, tier = resolve(lifetime)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::expiry::calculate_expiry;
use crate::redemption::RedemptionPolicy;
use crate::tier::{resolve_tier, tier_progress, TierBenefit, TierProgress};
use crate::types::{MilesTransaction, TransactionKind, UserMilesAccount};

impl UserMilesAccount {
    /// Opens an empty Standard account.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        UserMilesAccount {
            user_id: user_id.into(),
            total_miles: 0,
            available_miles: 0,
            used_miles: 0,
            lifetime_earned: 0,
            lifetime_spent: 0,
            tier: resolve_tier(0).tier,
            expiry_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Benefits of the account's current tier.
    pub fn tier_benefit(&self) -> &'static TierBenefit {
        resolve_tier(self.lifetime_earned)
    }

    /// Progress toward the next tier.
    pub fn tier_progress(&self) -> TierProgress {
        tier_progress(self.lifetime_earned)
    }

    /// Credits Miles earned from a booking.
    ///
    /// The expiry is set by the tier in effect when the booking was made,
    /// i.e. before this credit can promote the account.
    pub fn earn(
        &mut self,
        amount: i64,
        description: impl Into<String>,
        booking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> MilesTransaction {
        self.credit_earned(TransactionKind::Earn, amount, description.into(), booking_id, now)
    }

    /// Credits promotional Miles (referral, birthday, campaigns).
    pub fn award_bonus(
        &mut self,
        amount: i64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> MilesTransaction {
        self.credit_earned(TransactionKind::Bonus, amount, description.into(), None, now)
    }

    /// Spends Miles immediately.
    ///
    /// Runs the redemption rules against `available_miles` first; a failing
    /// rule leaves the account untouched.
    pub fn redeem(
        &mut self,
        amount: i64,
        policy: &RedemptionPolicy,
        description: impl Into<String>,
        booking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<MilesTransaction> {
        policy
            .check(self.available_miles, amount)
            .into_result()
            .map_err(CoreError::RedemptionRejected)?;

        self.total_miles -= amount;
        self.lifetime_spent += amount;
        Ok(self.record(TransactionKind::Redeem, amount, description.into(), booking_id, None, None, now))
    }

    /// Reserves Miles for a checkout that has not been paid yet.
    pub fn hold(&mut self, amount: i64, policy: &RedemptionPolicy) -> CoreResult<()> {
        policy
            .check(self.available_miles, amount)
            .into_result()
            .map_err(CoreError::RedemptionRejected)?;

        self.used_miles += amount;
        self.sync_available();
        Ok(())
    }

    /// Returns held Miles to the available balance (checkout abandoned).
    pub fn release_hold(&mut self, amount: i64) -> CoreResult<()> {
        self.check_held(amount)?;
        self.used_miles -= amount;
        self.sync_available();
        Ok(())
    }

    /// Turns held Miles into a redemption once the booking is paid.
    pub fn settle_hold(
        &mut self,
        amount: i64,
        description: impl Into<String>,
        booking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<MilesTransaction> {
        self.check_held(amount)?;
        self.used_miles -= amount;
        self.total_miles -= amount;
        self.lifetime_spent += amount;
        Ok(self.record(TransactionKind::Redeem, amount, description.into(), booking_id, None, None, now))
    }

    /// Removes expired Miles, capped at `available_miles`.
    ///
    /// Held Miles are never expired out from under an open checkout, and
    /// Miles already spent cannot expire twice. Returns `None` when nothing
    /// is left to expire.
    pub fn expire(
        &mut self,
        amount: i64,
        source_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<MilesTransaction> {
        debug_assert!(amount > 0, "expire amount must be positive");

        let amount = amount.min(self.available_miles);
        if amount <= 0 {
            return None;
        }

        self.total_miles -= amount;
        Some(self.record(
            TransactionKind::Expire,
            amount,
            "Miles expired".to_string(),
            None,
            source_id,
            None,
            now,
        ))
    }

    /// Credits Miles back after a cancelled booking that was paid in Miles.
    ///
    /// Refunds do not count as earning, so the tier is unaffected.
    pub fn refund(
        &mut self,
        amount: i64,
        description: impl Into<String>,
        booking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> MilesTransaction {
        debug_assert!(amount > 0, "refund amount must be positive");

        self.total_miles += amount;
        self.lifetime_spent -= amount.min(self.lifetime_spent);
        self.record(TransactionKind::Refund, amount, description.into(), booking_id, None, None, now)
    }

    fn credit_earned(
        &mut self,
        kind: TransactionKind,
        amount: i64,
        description: String,
        booking_id: Option<String>,
        now: DateTime<Utc>,
    ) -> MilesTransaction {
        debug_assert!(amount > 0, "credited amount must be positive");

        let expiry = calculate_expiry(now, self.tier);
        self.total_miles += amount;
        self.lifetime_earned += amount;
        self.expiry_date = expiry;
        self.record(kind, amount, description, booking_id, None, expiry, now)
    }

    fn check_held(&self, amount: i64) -> CoreResult<()> {
        if amount > self.used_miles {
            return Err(CoreError::HoldExceeded {
                held: self.used_miles,
                requested: amount,
            });
        }
        Ok(())
    }

    #[inline]
    fn sync_available(&mut self) {
        self.available_miles = self.total_miles - self.used_miles;
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        kind: TransactionKind,
        amount: i64,
        description: String,
        booking_id: Option<String>,
        source_id: Option<String>,
        expiry_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> MilesTransaction {
        self.sync_available();

        let tier = resolve_tier(self.lifetime_earned).tier;
        if tier != self.tier {
            debug!(user_id = %self.user_id, old = %self.tier, new = %tier, "Tier changed");
            self.tier = tier;
            if tier.never_expires() {
                self.expiry_date = None;
            }
        }
        self.updated_at = now;

        MilesTransaction {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            kind,
            amount,
            balance_after: self.total_miles,
            description,
            booking_id,
            source_id,
            created_at: now,
            expiry_date,
        }
    }
}

// =============================================================================
// Ledger Checks
// =============================================================================

/// Sum of all signed ledger effects.
pub fn ledger_balance(transactions: &[MilesTransaction]) -> i64 {
    transactions.iter().map(MilesTransaction::signed_amount).sum()
}

/// Checks both account invariants against the full transaction history.
///
/// - Σ(earn + bonus + refund) − Σ(redeem + expire) == `total_miles`
/// - `available_miles == total_miles - used_miles`
pub fn verify_ledger(account: &UserMilesAccount, transactions: &[MilesTransaction]) -> CoreResult<()> {
    let ledger = ledger_balance(transactions);
    if ledger != account.total_miles {
        return Err(CoreError::LedgerMismatch {
            user_id: account.user_id.clone(),
            ledger,
            account: account.total_miles,
        });
    }

    if account.available_miles != account.total_miles - account.used_miles {
        return Err(CoreError::BalanceDrift {
            user_id: account.user_id.clone(),
            available: account.available_miles,
            total: account.total_miles,
            used: account.used_miles,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redemption::RedemptionError;
    use crate::tier::Tier;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn policy() -> RedemptionPolicy {
        RedemptionPolicy::default()
    }

    #[test]
    fn test_new_account_is_empty_standard() {
        let account = UserMilesAccount::new("user-1", now());
        assert_eq!(account.total_miles, 0);
        assert_eq!(account.tier, Tier::Standard);
        assert_eq!(account.expiry_date, None);
        assert!(verify_ledger(&account, &[]).is_ok());
    }

    #[test]
    fn test_earn_credits_and_sets_expiry() {
        let mut account = UserMilesAccount::new("user-1", now());
        let tx = account.earn(1_500, "Hotel booking", Some("bk-1".into()), now());

        assert_eq!(tx.kind, TransactionKind::Earn);
        assert_eq!(tx.amount, 1_500);
        assert_eq!(tx.balance_after, 1_500);
        assert_eq!(tx.booking_id.as_deref(), Some("bk-1"));
        assert_eq!(tx.expiry_date, calculate_expiry(now(), Tier::Standard));

        assert_eq!(account.available_miles, 1_500);
        assert_eq!(account.lifetime_earned, 1_500);
        assert_eq!(account.tier, Tier::Silver);
    }

    #[test]
    fn test_redeem_never_lowers_lifetime_or_tier() {
        let mut account = UserMilesAccount::new("user-1", now());
        account.earn(5_200, "Tour", None, now());
        assert_eq!(account.tier, Tier::Gold);

        account
            .redeem(5_000, &policy(), "Car rental", None, now())
            .unwrap();

        assert_eq!(account.total_miles, 200);
        assert_eq!(account.available_miles, 200);
        assert_eq!(account.lifetime_earned, 5_200);
        assert_eq!(account.lifetime_spent, 5_000);
        assert_eq!(account.tier, Tier::Gold);
    }

    #[test]
    fn test_rejected_redeem_leaves_account_untouched() {
        let mut account = UserMilesAccount::new("user-1", now());
        account.earn(1_000, "Transfer", None, now());
        let before = account.clone();

        let err = account
            .redeem(150, &policy(), "Hotel", None, now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedemptionRejected(RedemptionError::NotMultipleOfStep { step: 100 })
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn test_hold_release_settle() {
        let mut account = UserMilesAccount::new("user-1", now());
        account.earn(1_000, "Hotel", None, now());

        account.hold(600, &policy()).unwrap();
        assert_eq!(account.used_miles, 600);
        assert_eq!(account.available_miles, 400);
        assert_eq!(account.total_miles, 1_000);

        // Held Miles are not available to a second checkout.
        assert!(matches!(
            account.hold(500, &policy()),
            Err(CoreError::RedemptionRejected(RedemptionError::InsufficientBalance))
        ));

        account.release_hold(200).unwrap();
        assert_eq!(account.available_miles, 600);

        let tx = account.settle_hold(400, "Tour", None, now()).unwrap();
        assert_eq!(tx.kind, TransactionKind::Redeem);
        assert_eq!(tx.balance_after, 600);
        assert_eq!(account.used_miles, 0);
        assert_eq!(account.available_miles, 600);

        assert!(matches!(
            account.settle_hold(100, "Tour", None, now()),
            Err(CoreError::HoldExceeded { held: 0, requested: 100 })
        ));
    }

    #[test]
    fn test_expire_is_capped_at_available() {
        let mut account = UserMilesAccount::new("user-1", now());
        account.earn(500, "Hotel", None, now());
        account.hold(300, &policy()).unwrap();

        let tx = account.expire(500, Some("earn-1".into()), now()).unwrap();
        assert_eq!(tx.amount, 200);
        assert_eq!(tx.source_id.as_deref(), Some("earn-1"));
        assert_eq!(account.total_miles, 300);
        assert_eq!(account.available_miles, 0);

        assert!(account.expire(100, None, now()).is_none());
    }

    #[test]
    fn test_refund_restores_balance_not_tier() {
        let mut account = UserMilesAccount::new("user-1", now());
        account.earn(900, "Hotel", None, now());
        account.redeem(800, &policy(), "Car", None, now()).unwrap();

        let tx = account.refund(800, "Car cancelled", None, now());
        assert_eq!(tx.kind, TransactionKind::Refund);
        assert_eq!(account.total_miles, 900);
        assert_eq!(account.lifetime_spent, 0);
        assert_eq!(account.lifetime_earned, 900);
        assert_eq!(account.tier, Tier::Standard);
    }

    #[test]
    fn test_vip_promotion_clears_account_expiry() {
        let mut account = UserMilesAccount::new("user-1", now());
        let tx = account.earn(10_000, "Villa", None, now());

        // Earned at Standard, so this batch still expires.
        assert!(tx.expiry_date.is_some());
        assert_eq!(account.tier, Tier::Vip);
        assert_eq!(account.expiry_date, None);

        let tx = account.earn(100, "Transfer", None, now());
        assert_eq!(tx.expiry_date, None);
    }

    #[test]
    fn test_ledger_invariant_across_sequence() {
        let mut account = UserMilesAccount::new("user-1", now());
        let mut ledger = Vec::new();
        let mut t = now();

        ledger.push(account.earn(1_500, "Hotel", None, t));
        verify_ledger(&account, &ledger).unwrap();

        t += Duration::days(3);
        ledger.push(account.award_bonus(300, "Referral", t));
        verify_ledger(&account, &ledger).unwrap();

        ledger.push(account.redeem(700, &policy(), "Tour", None, t).unwrap());
        verify_ledger(&account, &ledger).unwrap();

        account.hold(500, &policy()).unwrap();
        verify_ledger(&account, &ledger).unwrap();
        ledger.push(account.settle_hold(500, "Car", None, t).unwrap());
        verify_ledger(&account, &ledger).unwrap();

        ledger.push(account.expire(250, None, t).unwrap());
        verify_ledger(&account, &ledger).unwrap();

        ledger.push(account.refund(500, "Car cancelled", None, t));
        verify_ledger(&account, &ledger).unwrap();

        assert_eq!(account.total_miles, 1_500 + 300 - 700 - 500 - 250 + 500);
        assert_eq!(ledger_balance(&ledger), account.total_miles);
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let mut account = UserMilesAccount::new("user-1", now());
        let tx = account.earn(100, "Hotel", None, now());
        account.total_miles += 1;

        assert!(matches!(
            verify_ledger(&account, &[tx.clone()]),
            Err(CoreError::LedgerMismatch { ledger: 100, account: 101, .. })
        ));

        account.total_miles -= 1;
        account.available_miles = 42;
        assert!(matches!(
            verify_ledger(&account, &[tx]),
            Err(CoreError::BalanceDrift { .. })
        ));
    }
}
