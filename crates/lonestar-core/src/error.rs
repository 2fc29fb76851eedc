//! # Error Types
//!
//! Domain-specific error types for lonestar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lonestar-core (this file)                                             │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lonestar-db                                                           │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  lonestar-engine                                                       │
//! │  ├── EngineError      - CoreError | DbError                            │
//! │  └── ApiError         - What an HTTP caller sees (status + message)    │
//! │                                                                         │
//! │  Every error collapses to one ErrorKind: Validation, NotFound, Storage │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::currency::Currency;
use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// The three caller-visible failure categories.
///
/// | Kind         | HTTP | Retried |
/// |--------------|------|---------|
/// | `Validation` | 400  | never   |
/// | `NotFound`   | 404  | never   |
/// | `Storage`    | 500  | by the caller, if at all |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while validating a sale, return, credit
/// or rate update.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product with this id exists in the given store.
    #[error("Product {id} not found in store {store}")]
    ProductNotFound { id: String, store: String },

    /// No transaction with this id exists in the given store.
    #[error("Transaction {id} not found in store {store}")]
    TransactionNotFound { id: String, store: String },

    /// No *pending* credit with this id exists in the given store.
    ///
    /// Paying a credit that was already settled lands here too.
    #[error("Pending credit {id} not found in store {store}")]
    CreditNotFound { id: String, store: String },

    /// Requested more units than are on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: "Rice 25kg" × 5
    ///      │
    ///      ▼
    /// On hand: 3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Rice 25kg", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Money tendered does not cover the amount due.
    ///
    /// For `BOTH`, `tendered` is the LRD equivalent of both amounts.
    #[error("Insufficient payment in {currency}: due {due}, tendered {tendered}")]
    InsufficientPayment {
        currency: Currency,
        due: Money,
        tendered: Money,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps the error onto its caller-visible category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound { .. }
            | CoreError::TransactionNotFound { .. }
            | CoreError::CreditNotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::InsufficientPayment { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any inventory is touched, except where the check needs the
/// product record (stock) or the amount due (payment).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Date range with `from` after `to`.
    #[error("date range is inverted: {from} is after {to}")]
    InvertedRange { from: String, to: String },

    /// Value is outside what the engine can store or compute with.
    #[error("{field} is out of range (limit {limit})")]
    OutOfRange { field: String, limit: String },

    /// Duplicate value (e.g. the same product name twice in one store).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn out_of_range(field: impl Into<String>, limit: impl ToString) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            limit: limit.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
