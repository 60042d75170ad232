//! # Ledger Store Errors
//!
//! [`DbError`] is the single error a caller of `miles-db` matches on. It has
//! two sources: SQLite failures surfaced by sqlx, and rule rejections from
//! `miles-core`. Rule rejections are kept whole inside [`DbError::Core`], so
//! a checkout can still ask which redemption rule failed.
//!
//! SQLite failures are classified once, in `From<sqlx::Error>`:
//!
//! | SQLite reports                          | Becomes                    |
//! |-----------------------------------------|----------------------------|
//! | `SQLITE_BUSY` and its extended codes    | `ConcurrentModification`   |
//! | `UNIQUE constraint failed: t.col`       | `UniqueViolation`          |
//! | `FOREIGN KEY constraint failed`         | `ForeignKeyViolation`      |
//! | CHECK failure, append-only trigger, ... | `QueryFailed`              |
//! | no free connection in time              | `PoolExhausted`            |

use miles_core::{CoreError, RedemptionError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Primary and extended result codes SQLite uses for "database is busy":
/// `SQLITE_BUSY`, `_RECOVERY`, `_SNAPSHOT` and `_TIMEOUT`.
const SQLITE_BUSY_CODES: [&str; 4] = ["5", "261", "517", "773"];

/// Placeholder for ids SQLite does not report back.
const UNKNOWN: &str = "unknown";

#[derive(Debug, Error)]
pub enum DbError {
    /// No Miles account (or ledger row) with this id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A booking was credited twice, or an account row already exists.
    #[error("Duplicate entry violates {constraint}")]
    UniqueViolation { constraint: String },

    /// A ledger row points at an account or source entry that is not there.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another writer got to the account first.
    ///
    /// Raised when the stored `version` moved under us, or when SQLite kept
    /// the write lock busy past the busy timeout. Re-read and retry.
    #[error("Account {user_id} was modified concurrently")]
    ConcurrentModification { user_id: String },

    /// A Miles rule rejected the operation; nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite refused the statement (CHECK constraint, append-only trigger).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the redemption rule that failed, if that is what this is.
    pub fn redemption_error(&self) -> Option<&RedemptionError> {
        match self {
            DbError::Core(CoreError::RedemptionRejected(err)) => Some(err),
            _ => None,
        }
    }

    /// True when retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::ConcurrentModification { .. } | DbError::PoolExhausted)
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

fn classify(db_err: &dyn sqlx::error::DatabaseError) -> DbError {
    let busy = db_err
        .code()
        .is_some_and(|code| SQLITE_BUSY_CODES.iter().any(|busy| *busy == code));
    if busy {
        return DbError::ConcurrentModification {
            user_id: UNKNOWN.to_string(),
        };
    }

    let message = db_err.message();
    match db_err.kind() {
        ErrorKind::UniqueViolation => DbError::UniqueViolation {
            constraint: message
                .strip_prefix("UNIQUE constraint failed: ")
                .unwrap_or(message)
                .to_string(),
        },
        ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
            message: message.to_string(),
        },
        _ => DbError::QueryFailed(message.to_string()),
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", UNKNOWN),
            sqlx::Error::Database(db_err) => classify(&*db_err),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
