//! # Database Error Types
//!
//! Two layers of errors, and the one function that converts between them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Categorized, keeps the sqlx::Error as source                │
//! │       │                                                                 │
//! │       ▼  translate() ← logs exactly once                               │
//! │  RepositoryError ← What repository callers match on                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (apps/admin) ← Shell-level errors                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Display;

use sermac_core::ValidationError;
use thiserror::Error;
use tracing::{error, warn};

// =============================================================================
// DbError
// =============================================================================

/// Low-level database failures.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_optional` returns no row for a key
    /// - UPDATE / DELETE affected zero rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate RUT, duplicate sale line...).
    #[error("Duplicate {field}")]
    UniqueViolation {
        field: String,
        #[source]
        source: sqlx::Error,
    },

    /// Foreign key constraint violation.
    #[error("Foreign key violation")]
    ForeignKeyViolation(#[source] sqlx::Error),

    /// The connection string could not be understood.
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Pool already closed
    #[error("Connection failed")]
    ConnectionFailed(#[source] sqlx::Error),

    /// Schema bootstrap failed.
    #[error("Schema bootstrap failed")]
    SchemaFailed(#[source] sqlx::Error),

    /// Statement rejected by SQLite.
    #[error("Query failed")]
    QueryFailed(#[source] sqlx::Error),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted(#[source] sqlx::Error),

    /// Anything else sqlx reports (decode errors, I/O...).
    #[error("Internal database error")]
    Internal(#[source] sqlx::Error),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and key.
    pub fn not_found(entity: impl Into<String>, id: impl Display) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Constraint kind, else QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    // "UNIQUE constraint failed: Clientes.RUT"
                    let field = db_err
                        .message()
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        source: sqlx::Error::Database(db_err),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation(sqlx::Error::Database(db_err))
                } else {
                    DbError::QueryFailed(sqlx::Error::Database(db_err))
                }
            }

            err @ sqlx::Error::PoolTimedOut => DbError::PoolExhausted(err),

            err @ sqlx::Error::PoolClosed => DbError::ConnectionFailed(err),

            err => DbError::Internal(err),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// RepositoryError
// =============================================================================

/// Errors returned by repositories and the unit of work.
///
/// `NotFound` is kept apart from `Storage` so callers can tell "no such
/// client" from "the database failed".
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row for the key, or a mutation affected zero rows.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The store failed; `source` carries the classified cause.
    #[error("{message}")]
    Storage {
        entity: &'static str,
        message: String,
        #[source]
        source: DbError,
    },

    /// Input rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// commit/rollback called without begin.
    #[error("No active transaction")]
    NoActiveTransaction,

    /// begin called twice.
    #[error("A transaction is already active")]
    TransactionAlreadyActive,
}

impl RepositoryError {
    /// True for [`RepositoryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// The single boundary between storage failures and repository errors.
///
/// Not-found is logged at `warn`, everything else at `error`. The returned
/// error still carries the full cause.
pub(crate) fn translate(
    entity: &'static str,
    operation: &'static str,
    key: &dyn Display,
    err: DbError,
) -> RepositoryError {
    match err {
        DbError::NotFound { .. } => {
            warn!(entity, operation, key = %key, "{} not found", entity);
            RepositoryError::NotFound {
                entity,
                key: key.to_string(),
            }
        }
        err => {
            error!(entity, operation, key = %key, error = ?err, "Storage failure");
            RepositoryError::Storage {
                entity,
                message: format!("Failed to {} {} '{}'", operation, entity, key),
                source: err,
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_pool_errors_are_classified() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted(_)));

        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }

    #[test]
    fn test_translate_not_found() {
        let err = translate(
            "Cliente",
            "get",
            &"1-9",
            DbError::not_found("Cliente", "1-9"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cliente not found: 1-9");
    }

    #[test]
    fn test_translate_storage_keeps_source() {
        let err = translate("Venta", "add", &"10/P-1", sqlx::Error::PoolClosed.into());
        match &err {
            RepositoryError::Storage { entity, message, .. } => {
                assert_eq!(*entity, "Venta");
                assert_eq!(message, "Failed to add Venta '10/P-1'");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.source().is_some());
    }
}
