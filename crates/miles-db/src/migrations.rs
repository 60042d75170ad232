//! # Ledger Schema
//!
//! The SQL under `migrations/sqlite/` at the workspace root is compiled into
//! the crate. [`Database::new`](crate::Database::new) calls [`apply`] before
//! handing out any repository, so code never sees an old schema.
//!
//! sqlx records each applied file in `_sqlx_migrations` together with its
//! checksum and refuses to start when an applied file was edited. Ledger
//! schema changes therefore go into a new `NNN_*.sql` file;
//! `001_miles_ledger.sql` is frozen once it has shipped.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static LEDGER_SCHEMA: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the connected database is through the embedded migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub embedded: usize,
    pub applied: usize,
}

impl SchemaVersion {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies every embedded migration the database has not seen yet.
pub async fn apply(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = LEDGER_SCHEMA.migrations.len(), "Applying ledger schema");
    LEDGER_SCHEMA.run(pool).await?;

    let version = schema_version(pool).await?;
    info!(applied = version.applied, "Ledger schema up to date");
    Ok(())
}

pub async fn schema_version(pool: &SqlitePool) -> DbResult<SchemaVersion> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(SchemaVersion {
        embedded: LEDGER_SCHEMA.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_applying_twice_is_a_no_op() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = schema_version(db.pool()).await.unwrap();

        apply(db.pool()).await.unwrap();
        let second = schema_version(db.pool()).await.unwrap();

        assert_eq!(first, second);
        assert!(second.embedded >= 1);
        assert!(second.is_current());
    }
}
