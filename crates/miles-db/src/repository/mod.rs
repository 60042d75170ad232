//! # Repository Module
//!
//! Database repository implementations for the Miles ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Read-Modify-Write                                    │
//! │                                                                         │
//! │  db.accounts().redeem(user, 500, &policy, "Hotel")                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │  ├── SELECT account (or open a Standard one)                           │
//! │  ├── miles-core mutates the account, returns ledger entries            │
//! │  ├── UPDATE account ... WHERE version = <read version>                 │
//! │  ├── INSERT each ledger entry                                          │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure before COMMIT rolls everything back.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MilesAccountRepository`](account::MilesAccountRepository) - Accounts and ledger

pub mod account;
