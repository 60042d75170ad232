//! Ledger invariant across a realistic member history.
//!
//! After every operation, the sum of signed ledger entries equals
//! `total_miles` and `available_miles == total_miles - used_miles`.
//! Concurrent writers on a real database file must all land.

use std::path::{Path, PathBuf};

use chrono::Utc;
use miles_core::{ledger_balance, Money, RedemptionPolicy, Tier, TransactionKind};
use miles_db::{Database, DbConfig, DbError, MilesAccountRepository};
use uuid::Uuid;

const MEMBER: &str = "3d6f0a52-91c4-4b7e-a2d8-5c1e9f7b0a63";
const FRIEND: &str = "b8e2c4a1-6f3d-4e9b-9a07-2d5c8e1f4b36";

async fn assert_invariant(repo: &MilesAccountRepository, user_id: &str) {
    repo.verify(user_id).await.unwrap();

    let account = repo.get(user_id).await.unwrap().unwrap();
    let ledger = repo.ledger(user_id).await.unwrap();
    assert_eq!(ledger_balance(&ledger), account.total_miles);
    assert_eq!(account.available_miles, account.total_miles - account.used_miles);
    assert!(account.available_miles >= 0);
}

#[tokio::test]
async fn ledger_invariant_holds_after_every_operation() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let repo = db.accounts();
    let policy = RedemptionPolicy::default();

    // First booking: ₺1000 at Standard, +500 first booking bonus.
    let outcome = repo
        .earn_from_booking(MEMBER, "BK-1001", Money::from_lira(1_000))
        .await
        .unwrap();
    assert_eq!(outcome.earned.total_miles, 1_500);
    assert_eq!(outcome.account.tier, Tier::Silver);
    assert_invariant(&repo, MEMBER).await;

    // Fractional lira are floored: ₺99.99 at Silver → 99 + 9.
    let outcome = repo
        .earn_from_booking(MEMBER, "BK-1002", Money::from_lira_kurus(99, 99))
        .await
        .unwrap();
    assert_eq!(outcome.earned.base_miles, 99);
    assert_eq!(outcome.earned.total_miles, 108);
    assert_invariant(&repo, MEMBER).await;

    repo.apply_referral(MEMBER, FRIEND, Money::from_lira(4_999))
        .await
        .unwrap();
    assert_invariant(&repo, MEMBER).await;
    assert_invariant(&repo, FRIEND).await;

    repo.redeem(MEMBER, 600, &policy, "Boat tour").await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    repo.hold(MEMBER, 800, &policy).await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    repo.release_hold(MEMBER, 300).await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    repo.settle_hold(MEMBER, 500, "Airport transfer").await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    repo.refund(MEMBER, 500, "Transfer cancelled").await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    repo.award_birthday_bonus(MEMBER).await.unwrap();
    assert_invariant(&repo, MEMBER).await;

    // Rejected operations leave the ledger untouched.
    let before = repo.get(MEMBER).await.unwrap().unwrap();
    let err = repo.redeem(MEMBER, 150, &policy, "Hotel").await.unwrap_err();
    assert!(err.redemption_error().is_some());
    assert!(matches!(
        repo.settle_hold(MEMBER, 100, "Hotel").await,
        Err(DbError::Core(_))
    ));
    assert_eq!(repo.get(MEMBER).await.unwrap().unwrap(), before);
    assert_invariant(&repo, MEMBER).await;

    // Two years later everything still unspent lapses.
    let later = Utc::now() + chrono::Duration::days(365 * 2 + 2);
    let expired = repo.expire_due(MEMBER, later).await.unwrap();
    assert!(!expired.is_empty());
    assert!(expired.iter().all(|e| e.kind == TransactionKind::Expire));
    assert_invariant(&repo, MEMBER).await;

    let account = repo.get(MEMBER).await.unwrap().unwrap();
    let ledger = repo.ledger(MEMBER).await.unwrap();

    // Refund batches carry no expiry, so only they survive.
    let refunded: i64 = ledger
        .iter()
        .filter(|e| e.kind == TransactionKind::Refund)
        .map(|e| e.amount)
        .sum();
    assert_eq!(account.total_miles, refunded);

    // Expiry and redemption never lower the tier.
    assert_eq!(account.tier, Tier::Silver);
    assert_eq!(account.lifetime_earned, 1_500 + 108 + 300 + 250);
}

fn temp_ledger_path() -> PathBuf {
    std::env::temp_dir().join(format!("miles-ledger-{}.db", Uuid::new_v4()))
}

fn remove_ledger_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_for_one_member_all_land() {
    let path = temp_ledger_path();
    let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
        .await
        .unwrap();
    let repo = db.accounts();

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.earn_from_booking(MEMBER, &format!("BK-{n:03}"), Money::from_lira(100))
                    .await
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        outcomes.push(task.await.unwrap().unwrap());
    }

    // Exactly one booking was first; it carries the +500.
    let first: Vec<_> = outcomes
        .iter()
        .filter(|o| o.earned.total_miles == 600)
        .collect();
    assert_eq!(first.len(), 1);

    // 600 + 4 × 100 reaches Silver at 1000, the other 11 earn 110 each.
    let account = repo.get(MEMBER).await.unwrap().unwrap();
    assert_eq!(account.total_miles, 2_210);
    assert_eq!(account.lifetime_earned, 2_210);
    assert_eq!(account.tier, Tier::Silver);

    let ledger = repo.ledger(MEMBER).await.unwrap();
    assert_eq!(
        ledger.iter().filter(|e| e.kind == TransactionKind::Earn).count(),
        16
    );
    assert_invariant(&repo, MEMBER).await;

    db.pool().close().await;
    remove_ledger_files(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemptions_never_overdraw() {
    let path = temp_ledger_path();
    let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
        .await
        .unwrap();
    let repo = db.accounts();
    let policy = RedemptionPolicy::default();
    repo.award_bonus(MEMBER, 1_000, "Welcome").await.unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.redeem(MEMBER, 300, &policy, "Tour").await })
        })
        .collect();

    let mut granted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => granted += 1,
            Err(err) => assert!(err.redemption_error().is_some(), "unexpected error: {err}"),
        }
    }

    assert_eq!(granted, 3);
    let account = repo.get(MEMBER).await.unwrap().unwrap();
    assert_eq!(account.available_miles, 100);
    assert_invariant(&repo, MEMBER).await;

    db.pool().close().await;
    remove_ledger_files(&path);
}
