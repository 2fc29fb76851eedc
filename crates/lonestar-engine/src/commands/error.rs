//! # API Error Type
//!
//! What a command returns when it fails, with the HTTP status the calling
//! layer should answer with.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Lonestar POS                           │
//! │                                                                         │
//! │  HTTP layer                  Engine                                     │
//! │  ──────────                  ──────                                     │
//! │                                                                         │
//! │  POST /sales                                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  commands::sale::create_sale                                     │  │
//! │  │  Result<ApiResponse<Transaction>, ApiError>                      │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ─── DbError ─────────────── 500 INTERNAL ─────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Unknown id? ──────── CoreError::*NotFound ─── 404 NOT_FOUND ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Anything else ────── ValidationError etc. ── 400 VALIDATION ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────── ApiResponse { status: 201, body } ────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lonestar_core::{ErrorKind, ValidationError};
use serde::Serialize;
use ts_rs::TS;

use crate::error::EngineError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product 3f2a... not found in store Sinkor"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// try {
///   await api.createSale(sale);
/// } catch (e) {
///   switch (e.code) {
///     case 'VALIDATION_ERROR':
///       showForm(e.message);
///       break;
///     case 'NOT_FOUND':
///       showNotification('Product no longer exists');
///       break;
///     default:
///       showError('An error occurred');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed, stock or payment short (400)
    ValidationError,

    /// Resource not found in the store (404)
    NotFound,

    /// Storage failure (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for the code.
    pub const fn status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Storage => ErrorCode::Internal,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// A filter the query cannot run without.
    pub fn missing(field: &str) -> Self {
        ApiError::validation(ValidationError::required(field).to_string())
    }

    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Converts engine errors to API errors.
///
/// Storage details are logged, never returned.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = ErrorCode::from(err.kind());
        match code {
            ErrorCode::Internal => {
                tracing::error!(error = %err, "Command failed");
                ApiError::new(code, "Database operation failed")
            }
            _ => ApiError::new(code, err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(EngineError::from(err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
