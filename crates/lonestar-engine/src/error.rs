//! # Engine Error
//!
//! Everything a service call can fail with, collapsed onto
//! [`ErrorKind`] for callers that only care about the category.
//!
//! ```text
//! CoreError ──┐
//! DbError ────┼──► EngineError ──kind()──► Validation | NotFound | Storage
//! ConfigError ┘
//! ```

use lonestar_core::{CoreError, ErrorKind, ValidationError};
use lonestar_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(e) => e.kind(),
            EngineError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Db(DbError::UniqueViolation { .. }) => ErrorKind::Validation,
            EngineError::Db(_) => ErrorKind::Storage,
            // Bad configuration surfaces at startup, never from a request
            EngineError::Config(_) => ErrorKind::Storage,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
