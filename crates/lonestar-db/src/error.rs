//! # Database Error Types
//!
//! ```text
//! sqlx::Error ──► DbError ──► EngineError::kind() ──► ApiError status
//!                   │
//!                   ├── NotFound          404
//!                   ├── UniqueViolation   400  (duplicate product name)
//!                   └── everything else   500
//! ```

use sqlx::error::ErrorKind as SqlErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row, e.g. `(store, name)` on products.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A FOREIGN KEY, CHECK or NOT NULL constraint rejected the row.
    ///
    /// `quantity >= 0` is one of these, but the conditional decrement should
    /// never let it fire.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt {entity} row: {reason}")]
    Corrupt { entity: String, reason: String },

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::Corrupt {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "row".to_string(),
                id: "?".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    // SQLite: "UNIQUE constraint failed: products.store, products.name"
                    SqlErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                        value: String::new(),
                    },
                    SqlErrorKind::ForeignKeyViolation
                    | SqlErrorKind::CheckViolation
                    | SqlErrorKind::NotNullViolation => DbError::Constraint(message),
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::corrupt("column", format!("{index}: {source}"))
            }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_mapping() {
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DbError::duplicate("product name", "Rice").to_string(),
            "Duplicate product name: 'Rice' already exists"
        );
        assert_eq!(
            DbError::corrupt("credit", "bad status").to_string(),
            "Corrupt credit row: bad status"
        );
    }
}
