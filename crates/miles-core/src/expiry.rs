//! # Expiry Calculator
//!
//! Expiry dates for earned Miles and the "expiring soon" aggregate.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Earned 2024-06-15, Gold   → expires 2026-06-15                        │
//! │  Earned 2024-02-29, Silver → expires 2026-02-28  (calendar clamp)      │
//! │  Earned any date,   VIP    → never (None)                              │
//! │                                                                         │
//! │  Expiring soon: expiry_date ∈ [now, now + horizon]  (both inclusive)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here takes `now` as a parameter; nothing reads the clock.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::tier::Tier;
use crate::types::{MilesTransaction, TransactionKind};

/// Calendar years until non-VIP Miles expire.
pub const EXPIRY_YEARS: u32 = 2;

/// Default look-ahead window for [`get_expiring_miles`].
pub const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 90;

/// Returns when Miles earned at `earned_at` expire, or `None` for VIP.
///
/// Adds whole calendar years, clamping Feb 29 to Feb 28 in non-leap years.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use miles_core::expiry::calculate_expiry;
/// use miles_core::tier::Tier;
///
/// let earned = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
/// let expiry = calculate_expiry(earned, Tier::Gold).unwrap();
/// assert_eq!(expiry, Utc.with_ymd_and_hms(2026, 6, 15, 0, 0, 0).unwrap());
///
/// assert_eq!(calculate_expiry(earned, Tier::Vip), None);
/// ```
pub fn calculate_expiry(earned_at: DateTime<Utc>, tier: Tier) -> Option<DateTime<Utc>> {
    if tier.never_expires() {
        return None;
    }

    // Overflow is only possible near chrono's max date; saturate there so
    // `None` stays reserved for "never expires".
    Some(
        earned_at
            .checked_add_months(Months::new(EXPIRY_YEARS * 12))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

/// Miles due to expire inside a look-ahead window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringMiles {
    pub amount: i64,
    #[ts(as = "Option<String>")]
    pub earliest_expiry: Option<DateTime<Utc>>,
}

/// Sums transactions whose expiry falls in `[now, now + horizon_days]`.
///
/// A window reaching past chrono's date range ends at its last instant.
/// Order of `transactions` does not affect the result.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use miles_core::expiry::{get_expiring_miles, DEFAULT_EXPIRY_HORIZON_DAYS};
///
/// let summary = get_expiring_miles(&[], Utc::now(), DEFAULT_EXPIRY_HORIZON_DAYS);
/// assert_eq!(summary.amount, 0);
/// assert_eq!(summary.earliest_expiry, None);
/// ```
pub fn get_expiring_miles(
    transactions: &[MilesTransaction],
    now: DateTime<Utc>,
    horizon_days: i64,
) -> ExpiringMiles {
    let horizon_end = TimeDelta::try_days(horizon_days)
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(if horizon_days < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

    transactions
        .iter()
        .filter_map(|tx| tx.expiry_date.map(|expiry| (tx.amount, expiry)))
        .filter(|(_, expiry)| *expiry >= now && *expiry <= horizon_end)
        .fold(
            ExpiringMiles {
                amount: 0,
                earliest_expiry: None,
            },
            |acc, (amount, expiry)| ExpiringMiles {
                amount: acc.amount + amount,
                earliest_expiry: Some(acc.earliest_expiry.map_or(expiry, |e| e.min(expiry))),
            },
        )
}

/// A credit entry and how much of it is still unspent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBatch<'a> {
    pub entry: &'a MilesTransaction,
    pub remaining: i64,
}

/// An earned batch whose unspent remainder has passed its expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryDue {
    /// Id of the earn/bonus entry being expired.
    pub source_id: String,
    /// Miles of that entry not yet redeemed or expired.
    pub miles: i64,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
}

/// Replays the ledger and returns every credit with Miles left in it.
///
/// `transactions` must be in ledger order. Credits form batches; `expire`
/// entries drain the batch named by `source_id`, and `redeem` entries drain
/// batches oldest first.
pub fn open_batches(transactions: &[MilesTransaction]) -> Vec<OpenBatch<'_>> {
    let mut batches: Vec<OpenBatch<'_>> = Vec::new();

    for tx in transactions {
        match tx.kind {
            TransactionKind::Earn | TransactionKind::Bonus | TransactionKind::Refund => {
                batches.push(OpenBatch { entry: tx, remaining: tx.amount });
            }
            TransactionKind::Expire => {
                let source = tx.source_id.as_deref();
                match batches.iter_mut().find(|b| Some(b.entry.id.as_str()) == source) {
                    Some(batch) => batch.remaining -= tx.amount.min(batch.remaining),
                    None => drain_oldest(&mut batches, tx.amount),
                }
            }
            TransactionKind::Redeem => drain_oldest(&mut batches, tx.amount),
        }
    }

    batches.retain(|b| b.remaining > 0);
    batches
}

fn drain_oldest(batches: &mut [OpenBatch<'_>], mut amount: i64) {
    for batch in batches.iter_mut() {
        if amount == 0 {
            break;
        }
        let take = amount.min(batch.remaining);
        batch.remaining -= take;
        amount -= take;
    }
}

/// Finds the unspent remainder of every batch that expired by `now`.
///
/// Results are ordered oldest expiry first.
pub fn due_for_expiry(transactions: &[MilesTransaction], now: DateTime<Utc>) -> Vec<ExpiryDue> {
    let mut due: Vec<ExpiryDue> = open_batches(transactions)
        .into_iter()
        .filter(|b| b.entry.kind.can_expire())
        .filter_map(|b| {
            b.entry
                .expiry_date
                .filter(|expiry| *expiry <= now)
                .map(|expiry_date| ExpiryDue {
                    source_id: b.entry.id.clone(),
                    miles: b.remaining,
                    expiry_date,
                })
        })
        .collect();

    due.sort_by_key(|d| d.expiry_date);
    due
}

/// Like [`get_expiring_miles`], but counts only what is left of each batch.
pub fn unspent_expiring_miles(
    transactions: &[MilesTransaction],
    now: DateTime<Utc>,
    horizon_days: i64,
) -> ExpiringMiles {
    let remaining: Vec<MilesTransaction> = open_batches(transactions)
        .into_iter()
        .map(|b| MilesTransaction {
            amount: b.remaining,
            ..b.entry.clone()
        })
        .collect();

    get_expiring_miles(&remaining, now, horizon_days)
}

// =============================================================================
// Unit Tests
// =============================================================================
