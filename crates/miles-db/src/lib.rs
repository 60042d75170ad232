//! # miles-db: SQLite Ledger for Miles Loyalty
//!
//! This crate persists Miles accounts and their append-only transaction
//! ledger. It uses SQLite with sqlx for async operations; every rule it
//! applies comes from `miles-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Miles Data Flow                                  │
//! │                                                                         │
//! │  Booking completed / checkout / nightly expiry sweep                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     miles-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repository      │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │   (account.rs)     │  │ (embedded) │  │   │
//! │  │   │               │    │                    │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ MilesAccountRepo   │  │ 001_miles_ │  │   │
//! │  │   │ WAL, FKs on   │    │ earn/redeem/hold/  │  │ ledger.sql │  │   │
//! │  │   │               │    │ expire/referral    │  │            │  │   │
//! │  │   └───────────────┘    └─────────┬──────────┘  └────────────┘  │   │
//! │  │                                  │ pure rules                  │   │
//! │  │                                  ▼                             │   │
//! │  │                             miles-core                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │    SQLite: miles_accounts + miles_transactions (append-only)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Account and ledger repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use miles_db::{Database, MilesConfig};
//!
//! let config = MilesConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let outcome = db.accounts().earn_from_booking(&user_id, "bk-1042", amount).await?;
//! db.accounts().redeem(&user_id, 500, &config.redemption, "Hotel checkout").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, MilesConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::{EarnOutcome, MilesAccountRepository};
