//! Database error types
//!
//! SQLx failures are classified by PostgreSQL SQLSTATE and, for integrity
//! violations, by constraint name so the partner domain can tell an
//! identifier race from a duplicate code.

use thiserror::Error;

use domain_partner::{StorageError, UniqueTarget};

/// Primary key of `c_bpartner`: `(ad_client_id, c_bpartner_id)`
pub const PARTNER_PKEY: &str = "c_bpartner_pkey";
/// Unique partner code per tenant: `(ad_client_id, value)`
pub const PARTNER_CODE_KEY: &str = "c_bpartner_value_key";

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation (SQLSTATE 23505)
    #[error("Duplicate entry on {}: {message}", .constraint.as_deref().unwrap_or("unknown constraint"))]
    DuplicateEntry {
        constraint: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation (SQLSTATE 23503)
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Serialization failure or deadlock (SQLSTATE 40001, 40P01)
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// PostgreSQL error codes:
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry {
                        constraint: db_err.constraint().map(str::to_string),
                        message,
                    },
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("40001") | Some("40P01") => DatabaseError::TransactionConflict(message),
                    Some(code) if code.starts_with("08") => {
                        DatabaseError::ConnectionFailed(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for StorageError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::DuplicateEntry { constraint, message } => {
                match constraint.as_deref() {
                    Some(PARTNER_PKEY) => StorageError::unique(UniqueTarget::Identifier, message),
                    Some(PARTNER_CODE_KEY) => StorageError::unique(UniqueTarget::Code, message),
                    _ => StorageError::backend(message),
                }
            }
            DatabaseError::ForeignKeyViolation(message) => StorageError::foreign_key(message),
            DatabaseError::TransactionConflict(message) => StorageError::Conflict(message),
            e @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => {
                StorageError::Unavailable(e.to_string())
            }
            other => StorageError::backend(other.to_string()),
        }
    }
}
