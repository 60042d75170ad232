//! # Miles Account Repository
//!
//! Database operations for Miles accounts and their ledger.
//!
//! ## Account Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Account Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── first operation for a user opens a Standard account            │
//! │                                                                         │
//! │  2. EARN                                                               │
//! │     └── earn_from_booking() → earn entry (+ first booking bonus)       │
//! │     └── award_bonus() / apply_referral() / birthday → bonus entries    │
//! │                                                                         │
//! │  3. SPEND                                                              │
//! │     └── redeem() → redeem entry                                        │
//! │     └── hold() → settle_hold() → redeem entry                          │
//! │     └── hold() → release_hold() → nothing written to the ledger        │
//! │     └── refund() → refund entry                                        │
//! │                                                                         │
//! │  4. EXPIRE                                                             │
//! │     └── expire_due() → one expire entry per lapsed batch               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use miles_core::earn::{calculate_miles_earned, MilesEarned};
use miles_core::expiry::{due_for_expiry, unspent_expiring_miles, ExpiringMiles};
use miles_core::ledger::verify_ledger;
use miles_core::referral::{calculate_referral_bonus, ReferralBonus};
use miles_core::tier::{tier_progress, Tier, TierProgress};
use miles_core::validation::{
    validate_booking_amount, validate_description, validate_horizon_days, validate_miles_amount,
    validate_user_id,
};
use miles_core::{
    CoreResult, MilesTransaction, Money, RedemptionPolicy, UserMilesAccount, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;

/// Result of crediting a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnOutcome {
    /// Calculator breakdown (base, bonus, reasons).
    pub earned: MilesEarned,
    /// The earn entry, `None` when the booking earned nothing.
    pub transaction: Option<MilesTransaction>,
    /// Tier before this booking was credited.
    pub previous_tier: Tier,
    /// Account after the credit.
    pub account: UserMilesAccount,
}

impl EarnOutcome {
    /// True when this booking moved the account up a tier.
    pub fn promoted(&self) -> bool {
        self.account.tier > self.previous_tier
    }
}

/// Repository for Miles accounts and ledger entries.
#[derive(Debug, Clone)]
pub struct MilesAccountRepository {
    pool: SqlitePool,
}

impl MilesAccountRepository {
    /// Creates a new MilesAccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MilesAccountRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an account by user id.
    pub async fn get(&self, user_id: &str) -> DbResult<Option<UserMilesAccount>> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut conn, user_id).await
    }

    /// Gets an account, opening an empty Standard one if none exists.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<UserMilesAccount> {
        validate_user_id(user_id)?;

        let mut tx = begin_write(&self.pool).await?;
        let account = load_or_open(&mut tx, user_id, Utc::now()).await?;
        tx.commit().await?;

        Ok(account)
    }

    /// Counts accounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM miles_accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Most recent ledger entries for a user, newest first.
    pub async fn transactions(&self, user_id: &str, limit: i64) -> DbResult<Vec<MilesTransaction>> {
        let transactions = sqlx::query_as::<_, MilesTransaction>(
            r#"
            SELECT id, user_id, kind, amount, balance_after, description,
                   booking_id, source_id, created_at, expiry_date
            FROM miles_transactions
            WHERE user_id = ?1
            ORDER BY rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Full ledger for a user, oldest first.
    pub async fn ledger(&self, user_id: &str) -> DbResult<Vec<MilesTransaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_ledger(&mut conn, user_id).await
    }

    /// Progress toward the next tier. Users without an account are Standard at 0.
    pub async fn tier_progress(&self, user_id: &str) -> DbResult<TierProgress> {
        let lifetime_earned = self
            .get(user_id)
            .await?
            .map_or(0, |account| account.lifetime_earned);

        Ok(tier_progress(lifetime_earned))
    }

    /// Unspent Miles that expire within `horizon_days` of `now`.
    pub async fn expiring_summary(
        &self,
        user_id: &str,
        horizon_days: i64,
        now: DateTime<Utc>,
    ) -> DbResult<ExpiringMiles> {
        validate_horizon_days(horizon_days)?;

        let ledger = self.ledger(user_id).await?;
        Ok(unspent_expiring_miles(&ledger, now, horizon_days))
    }

    /// Checks the stored balances against the ledger.
    pub async fn verify(&self, user_id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        let account = fetch_account(&mut conn, user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Miles account", user_id))?;
        let ledger = fetch_ledger(&mut conn, user_id).await?;

        verify_ledger(&account, &ledger)?;
        Ok(())
    }

    // =========================================================================
    // Earning
    // =========================================================================

    /// Credits the Miles earned by a completed booking.
    ///
    /// The first earn on an account gets the first booking bonus. A booking
    /// id can only be credited once.
    pub async fn earn_from_booking(
        &self,
        user_id: &str,
        booking_id: &str,
        amount: Money,
    ) -> DbResult<EarnOutcome> {
        validate_user_id(user_id)?;
        validate_booking_amount(amount)?;
        let booking_id = require_booking_id(booking_id)?;

        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;
        let mut account = load_or_open(&mut tx, user_id, now).await?;
        let expected_version = account.version;
        let previous_tier = account.tier;

        let prior_earns: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM miles_transactions WHERE user_id = ?1 AND kind = 'earn'",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let is_first_booking = prior_earns == 0;

        let earned = calculate_miles_earned(amount, account.tier, is_first_booking);

        let transaction = if earned.total_miles > 0 {
            let entry = account.earn(
                earned.total_miles,
                format!("Miles earned for booking {booking_id}"),
                Some(booking_id.clone()),
                now,
            );
            persist(&mut tx, &mut account, expected_version, std::slice::from_ref(&entry)).await?;
            Some(entry)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            user_id,
            booking_id = %booking_id,
            amount = %amount,
            miles = earned.total_miles,
            first_booking = is_first_booking,
            balance = account.total_miles,
            tier = %account.tier,
            "Booking credited"
        );

        Ok(EarnOutcome {
            earned,
            transaction,
            previous_tier,
            account,
        })
    }

    /// Credits promotional Miles.
    pub async fn award_bonus(
        &self,
        user_id: &str,
        miles: i64,
        reason: &str,
    ) -> DbResult<MilesTransaction> {
        validate_miles_amount(miles)?;
        let reason = validate_description(reason)?;

        let (entry, account) = self
            .mutate(user_id, move |account, now| {
                let entry = account.award_bonus(miles, reason, now);
                Ok((entry.clone(), vec![entry]))
            })
            .await?;

        info!(user_id, miles, balance = account.total_miles, "Bonus awarded");
        Ok(entry)
    }

    /// Credits the birthday bonus of the account's current tier.
    pub async fn award_birthday_bonus(&self, user_id: &str) -> DbResult<MilesTransaction> {
        let (entry, account) = self
            .mutate(user_id, |account, now| {
                let miles = account.tier.benefit().birthday_bonus;
                let description = format!("{} birthday bonus", account.tier.display_name());
                let entry = account.award_bonus(miles, description, now);
                Ok((entry.clone(), vec![entry]))
            })
            .await?;

        info!(user_id, miles = entry.amount, tier = %account.tier, "Birthday bonus awarded");
        Ok(entry)
    }

    /// Credits both sides of a referral in one transaction.
    ///
    /// The referrer's bonus is set by the referrer's tier before either
    /// credit lands.
    pub async fn apply_referral(
        &self,
        referrer_id: &str,
        referred_id: &str,
        referred_amount: Money,
    ) -> DbResult<ReferralBonus> {
        validate_user_id(referrer_id)?;
        validate_user_id(referred_id)?;
        validate_booking_amount(referred_amount)?;
        if referrer_id == referred_id {
            return Err(ValidationError::InvalidFormat {
                field: "referred_id".to_string(),
                reason: "a user cannot refer themselves".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        let mut referrer = load_or_open(&mut tx, referrer_id, now).await?;
        let mut referred = load_or_open(&mut tx, referred_id, now).await?;
        let referrer_version = referrer.version;
        let referred_version = referred.version;

        let bonus = calculate_referral_bonus(referrer.tier, referred_amount);

        let referrer_entry = referrer.award_bonus(bonus.referrer_bonus, "Referral bonus", now);
        let referred_entry = referred.award_bonus(bonus.referred_bonus, "Welcome referral bonus", now);

        persist(&mut tx, &mut referrer, referrer_version, &[referrer_entry]).await?;
        persist(&mut tx, &mut referred, referred_version, &[referred_entry]).await?;
        tx.commit().await?;

        info!(
            referrer_id,
            referred_id,
            referrer_bonus = bonus.referrer_bonus,
            referred_bonus = bonus.referred_bonus,
            "Referral applied"
        );

        Ok(bonus)
    }

    // =========================================================================
    // Spending
    // =========================================================================

    /// Spends Miles immediately.
    ///
    /// A failed redemption rule comes back as
    /// `DbError::Core(CoreError::RedemptionRejected(..))` and writes nothing.
    pub async fn redeem(
        &self,
        user_id: &str,
        miles: i64,
        policy: &RedemptionPolicy,
        description: &str,
    ) -> DbResult<MilesTransaction> {
        let description = validate_description(description)?;
        let policy = *policy;

        let result = self
            .mutate(user_id, move |account, now| {
                let entry = account.redeem(miles, &policy, description, None, now)?;
                Ok((entry.clone(), vec![entry]))
            })
            .await;

        match result {
            Ok((entry, account)) => {
                info!(user_id, miles, balance = account.total_miles, "Miles redeemed");
                Ok(entry)
            }
            Err(err) => {
                if let Some(rule) = err.redemption_error() {
                    warn!(user_id, miles, reason = %rule, "Redemption rejected");
                }
                Err(err)
            }
        }
    }

    /// Reserves Miles for an unpaid checkout.
    pub async fn hold(
        &self,
        user_id: &str,
        miles: i64,
        policy: &RedemptionPolicy,
    ) -> DbResult<UserMilesAccount> {
        validate_miles_amount(miles)?;
        let policy = *policy;

        let ((), account) = self
            .mutate(user_id, move |account, _now| {
                account.hold(miles, &policy)?;
                Ok(((), Vec::new()))
            })
            .await?;

        debug!(user_id, miles, used = account.used_miles, available = account.available_miles, "Miles held");
        Ok(account)
    }

    /// Returns held Miles after an abandoned checkout.
    pub async fn release_hold(&self, user_id: &str, miles: i64) -> DbResult<UserMilesAccount> {
        validate_miles_amount(miles)?;

        let ((), account) = self
            .mutate(user_id, move |account, _now| {
                account.release_hold(miles)?;
                Ok(((), Vec::new()))
            })
            .await?;

        debug!(user_id, miles, used = account.used_miles, available = account.available_miles, "Hold released");
        Ok(account)
    }

    /// Turns held Miles into a redemption once the booking is paid.
    pub async fn settle_hold(
        &self,
        user_id: &str,
        miles: i64,
        description: &str,
    ) -> DbResult<MilesTransaction> {
        validate_miles_amount(miles)?;
        let description = validate_description(description)?;

        let (entry, account) = self
            .mutate(user_id, move |account, now| {
                let entry = account.settle_hold(miles, description, None, now)?;
                Ok((entry.clone(), vec![entry]))
            })
            .await?;

        info!(user_id, miles, balance = account.total_miles, "Hold settled");
        Ok(entry)
    }

    /// Credits redeemed Miles back after a cancellation.
    pub async fn refund(&self, user_id: &str, miles: i64, reason: &str) -> DbResult<MilesTransaction> {
        validate_miles_amount(miles)?;
        let reason = validate_description(reason)?;

        let (entry, account) = self
            .mutate(user_id, move |account, now| {
                let entry = account.refund(miles, reason, None, now);
                Ok((entry.clone(), vec![entry]))
            })
            .await?;

        info!(user_id, miles, balance = account.total_miles, "Miles refunded");
        Ok(entry)
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    /// Writes an expire entry for every batch whose expiry is at or before `now`.
    ///
    /// Only the unspent part of a batch expires, capped at what is not on
    /// hold. Returns the entries written; empty when nothing was due.
    pub async fn expire_due(&self, user_id: &str, now: DateTime<Utc>) -> DbResult<Vec<MilesTransaction>> {
        let mut tx = begin_write(&self.pool).await?;

        let Some(mut account) = fetch_account(&mut tx, user_id).await? else {
            return Ok(Vec::new());
        };
        let expected_version = account.version;
        let ledger = fetch_ledger(&mut tx, user_id).await?;

        let entries: Vec<MilesTransaction> = due_for_expiry(&ledger, now)
            .into_iter()
            .filter_map(|due| account.expire(due.miles, Some(due.source_id), now))
            .collect();

        if entries.is_empty() {
            return Ok(entries);
        }

        persist(&mut tx, &mut account, expected_version, &entries).await?;
        tx.commit().await?;

        let expired: i64 = entries.iter().map(|e| e.amount).sum();
        info!(
            user_id,
            batches = entries.len(),
            miles = expired,
            balance = account.total_miles,
            "Expired Miles removed"
        );

        Ok(entries)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Runs one ledger mutation as a single SQLite transaction.
    async fn mutate<T, F>(&self, user_id: &str, op: F) -> DbResult<(T, UserMilesAccount)>
    where
        F: FnOnce(&mut UserMilesAccount, DateTime<Utc>) -> CoreResult<(T, Vec<MilesTransaction>)>,
    {
        validate_user_id(user_id)?;

        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;
        let mut account = load_or_open(&mut tx, user_id, now).await?;
        let expected_version = account.version;

        let (value, entries) = op(&mut account, now)?;

        persist(&mut tx, &mut account, expected_version, &entries).await?;
        tx.commit().await?;

        Ok((value, account))
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn require_booking_id(booking_id: &str) -> DbResult<String> {
    let booking_id = booking_id.trim();
    if booking_id.is_empty() {
        return Err(ValidationError::Required {
            field: "booking_id".to_string(),
        }
        .into());
    }
    Ok(booking_id.to_string())
}

async fn fetch_account(conn: &mut SqliteConnection, user_id: &str) -> DbResult<Option<UserMilesAccount>> {
    let account = sqlx::query_as::<_, UserMilesAccount>(
        r#"
        SELECT user_id, total_miles, available_miles, used_miles,
               lifetime_earned, lifetime_spent, tier, expiry_date,
               created_at, updated_at, version
        FROM miles_accounts
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(account)
}

async fn fetch_ledger(conn: &mut SqliteConnection, user_id: &str) -> DbResult<Vec<MilesTransaction>> {
    let ledger = sqlx::query_as::<_, MilesTransaction>(
        r#"
        SELECT id, user_id, kind, amount, balance_after, description,
               booking_id, source_id, created_at, expiry_date
        FROM miles_transactions
        WHERE user_id = ?1
        ORDER BY rowid ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ledger)
}

async fn load_or_open(
    conn: &mut SqliteConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> DbResult<UserMilesAccount> {
    if let Some(account) = fetch_account(&mut *conn, user_id).await? {
        return Ok(account);
    }

    let account = UserMilesAccount::new(user_id, now);

    sqlx::query(
        r#"
        INSERT INTO miles_accounts (
            user_id, total_miles, available_miles, used_miles,
            lifetime_earned, lifetime_spent, tier, expiry_date,
            created_at, updated_at, version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&account.user_id)
    .bind(account.total_miles)
    .bind(account.available_miles)
    .bind(account.used_miles)
    .bind(account.lifetime_earned)
    .bind(account.lifetime_spent)
    .bind(account.tier)
    .bind(account.expiry_date)
    .bind(account.created_at)
    .bind(account.updated_at)
    .bind(account.version)
    .execute(&mut *conn)
    .await?;

    info!(user_id, "Opened Miles account");
    Ok(account)
}

/// Writes the account back and appends its new ledger entries.
///
/// The update only lands if the row still has `expected_version`.
async fn persist(
    conn: &mut SqliteConnection,
    account: &mut UserMilesAccount,
    expected_version: i64,
    entries: &[MilesTransaction],
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE miles_accounts SET
            total_miles = ?1,
            available_miles = ?2,
            used_miles = ?3,
            lifetime_earned = ?4,
            lifetime_spent = ?5,
            tier = ?6,
            expiry_date = ?7,
            updated_at = ?8,
            version = version + 1
        WHERE user_id = ?9 AND version = ?10
        "#,
    )
    .bind(account.total_miles)
    .bind(account.available_miles)
    .bind(account.used_miles)
    .bind(account.lifetime_earned)
    .bind(account.lifetime_spent)
    .bind(account.tier)
    .bind(account.expiry_date)
    .bind(account.updated_at)
    .bind(&account.user_id)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(user_id = %account.user_id, expected_version, "Lost update race");
        return Err(DbError::ConcurrentModification {
            user_id: account.user_id.clone(),
        });
    }
    account.version = expected_version + 1;

    for entry in entries {
        debug!(id = %entry.id, kind = entry.kind.as_str(), amount = entry.amount, "Appending ledger entry");

        sqlx::query(
            r#"
            INSERT INTO miles_transactions (
                id, user_id, kind, amount, balance_after, description,
                booking_id, source_id, created_at, expiry_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.kind)
        .bind(entry.amount)
        .bind(entry.balance_after)
        .bind(&entry.description)
        .bind(&entry.booking_id)
        .bind(&entry.source_id)
        .bind(entry.created_at)
        .bind(entry.expiry_date)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
