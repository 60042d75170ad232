//! # Seed Data Generator
//!
//! Populates the database with demo Miles accounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed with the configured database (MILES_DB_PATH or ./miles_dev.db)
//! cargo run -p miles-db --bin seed
//!
//! # Specify database path
//! cargo run -p miles-db --bin seed -- --db ./data/miles.db
//!
//! # More log output
//! RUST_LOG=debug cargo run -p miles-db --bin seed
//! ```
//!
//! ## Generated Accounts
//! One member per tier, built from realistic booking histories:
//! - Standard: a single transfer booking
//! - Silver: hotel + tour, one redemption
//! - Gold: several hotel stays, a held checkout that was settled
//! - VIP: villa rentals, referred the Standard member

use std::env;

use miles_core::Money;
use miles_db::{migrations, Database, MilesConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// (member name, bookings in lira, miles to redeem after booking)
const MEMBERS: &[(&str, &[i64], i64)] = &[
    ("Ayşe (standard)", &[350], 0),
    ("Mehmet (silver)", &[1_200, 900], 500),
    ("Zeynep (gold)", &[2_500, 1_800, 1_400], 1_000),
    ("Can (vip)", &[6_000, 4_500], 2_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = MilesConfig::load()?;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Miles Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $MILES_DB_PATH or ./miles_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Miles Seed Data Generator");
    println!("============================");
    println!("Database: {}", config.database_path);
    println!();

    let db = Database::new(config.db_config()).await?;
    let accounts = db.accounts();

    let schema = migrations::schema_version(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Ledger schema at migration {}/{}", schema.applied, schema.embedded);

    let existing = accounts.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} accounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating members...");

    let mut member_ids = Vec::with_capacity(MEMBERS.len());

    for (name, bookings, redeem) in MEMBERS {
        let user_id = Uuid::new_v4().to_string();

        for (n, lira) in bookings.iter().enumerate() {
            let booking_id = format!("BK-{}-{}", &user_id[..8], n + 1);
            accounts
                .earn_from_booking(&user_id, &booking_id, Money::from_lira(*lira))
                .await?;
        }

        if *redeem > 0 {
            // Gold goes through the checkout hold path, the rest redeem directly.
            if name.contains("gold") {
                accounts.hold(&user_id, *redeem, &config.redemption).await?;
                accounts.settle_hold(&user_id, *redeem, "Hotel checkout").await?;
            } else {
                accounts
                    .redeem(&user_id, *redeem, &config.redemption, "Tour discount")
                    .await?;
            }
        }

        accounts.verify(&user_id).await?;
        member_ids.push((*name, user_id));
    }

    // VIP refers the Standard member on a high-value booking.
    let (_, standard_id) = &member_ids[0];
    let (_, vip_id) = &member_ids[3];
    let bonus = accounts
        .apply_referral(vip_id, standard_id, Money::from_lira(5_000))
        .await?;
    info!(
        referrer_bonus = bonus.referrer_bonus,
        referred_bonus = bonus.referred_bonus,
        "Demo referral applied"
    );

    println!();
    for (name, user_id) in &member_ids {
        let account = accounts
            .get(user_id)
            .await?
            .ok_or("seeded account disappeared")?;
        let expiring = accounts
            .expiring_summary(user_id, config.expiry_horizon_days, chrono::Utc::now())
            .await?;

        println!(
            "  {:<18} {:>6} Miles  tier={:<8} lifetime={:>6}  expiring={}",
            name,
            account.available_miles,
            account.tier.display_name(),
            account.lifetime_earned,
            expiring.amount,
        );
        println!("    {}", serde_json::to_string(&account.tier_progress())?);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=miles_db=trace` - Show trace for the ledger only
/// - Default: INFO, with debug for miles crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,miles_core=debug,miles_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
