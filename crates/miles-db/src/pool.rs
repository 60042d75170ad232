//! # Ledger Connection Pool
//!
//! Opens the SQLite file that holds Miles accounts and their ledger, applies
//! the schema, and hands out [`MilesAccountRepository`] handles.
//!
//! ## Connection Settings
//! Every pooled connection runs with:
//! - WAL journal, so balance reads never wait on a writer
//! - `synchronous = NORMAL`
//! - foreign keys enforced (ledger rows must point at an account)
//! - a busy timeout, the time a writer queues for the write lock
//!
//! ## Writers
//! ```text
//!  earn_from_booking ─┐
//!  redeem            ─┼─► begin_write ─► BEGIN IMMEDIATE ─► read account
//!  expire_due        ─┘        │                              │ apply rule
//!                              │ lock held by someone else?   ▼ persist + COMMIT
//!                              └─► wait up to busy_timeout, then ConcurrentModification
//! ```
//! Writers hold the write lock from the first statement, so no two of them
//! ever read the same balance, and none fails a deferred lock upgrade.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::account::MilesAccountRepository;

const MEMORY_PATH: &str = ":memory:";

/// Where the ledger lives and how many connections may touch it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Default 5. Forced to 1 for `:memory:`, where each connection would
    /// otherwise see its own empty database.
    pub max_connections: u32,
    /// How long a writer waits for another writer's lock. Default 5 s.
    pub busy_timeout: Duration,
}

impl DbConfig {
    /// File-backed ledger; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Private throwaway ledger for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        base.journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
    }
}

/// Shared handle to the Miles ledger. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let mut options = SqlitePoolOptions::new();
        let max_connections = if config.is_in_memory() {
            // The database lives and dies with its only connection.
            options = options.min_connections(1).idle_timeout(None).max_lifetime(None);
            1
        } else {
            config.max_connections
        };

        let pool = options
            .max_connections(max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            path = %config.database_path.display(),
            max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Miles ledger opened"
        );

        migrations::apply(&pool).await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn accounts(&self) -> MilesAccountRepository {
        MilesAccountRepository::new(self.pool.clone())
    }
}

/// Opens a transaction that already holds the SQLite write lock.
///
/// Every read-modify-write on an account goes through here.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_ledger_starts_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(db.accounts().count().await.unwrap(), 0);
        let schema = migrations::schema_version(db.pool()).await.unwrap();
        assert!(schema.is_current());
    }

    #[tokio::test]
    async fn test_write_transactions_do_not_nest() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = begin_write(db.pool()).await.unwrap();
        sqlx::query("SELECT 1").execute(&mut *tx).await.unwrap();
        tx.commit().await.unwrap();

        // The single in-memory connection is back in the pool and reusable.
        let tx = begin_write(db.pool()).await.unwrap();
        tx.rollback().await.unwrap();
    }

    #[test]
    fn test_config() {
        let config = DbConfig::new("/var/lib/miles/ledger.db").max_connections(8);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(!config.is_in_memory());

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }
}
