//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Referential integrity violated at the storage layer
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The database file is locked by another writer
    #[error("database is busy")]
    Busy,

    /// Input rejected before any storage operation ran
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    /// Stable machine-readable kind for structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseError::Validation(_) => "validation",
            DatabaseError::NotFound { .. } => "not_found",
            DatabaseError::AlreadyExists { .. } | DatabaseError::Constraint(_) => {
                "constraint_violation"
            }
            DatabaseError::Busy => "storage_busy",
            DatabaseError::Sqlx(_) | DatabaseError::Migration(_) => "internal",
        }
    }
}

/// SQLite result codes reported when the database file is locked:
/// SQLITE_BUSY, SQLITE_BUSY_RECOVERY, SQLITE_BUSY_SNAPSHOT.
const SQLITE_BUSY_CODES: &[&str] = &["5", "261", "517"];

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_foreign_key_violation() {
                return DatabaseError::Constraint(db_err.message().to_string());
            }
            if let Some(code) = db_err.code() {
                if SQLITE_BUSY_CODES.contains(&code.as_ref()) {
                    return DatabaseError::Busy;
                }
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
