//! # Command Layer
//!
//! Request/response contracts an HTTP front end maps one-to-one onto
//! routes. Every command takes the [`Engine`](crate::Engine) and a
//! deserialized request, and answers with an [`ApiResponse`] or an
//! [`ApiError`], both carrying the status code to send.
//!
//! ## Command Groups
//! - `sale`: sales, returns, restocks and transaction queries
//! - `credit`: tabs, payments and balances
//! - `currency`: exchange rate read and update
//! - `report`: sales report and top products
//! - `product`: catalog registration and listing

pub mod credit;
pub mod currency;
pub mod error;
pub mod product;
pub mod report;
pub mod sale;

use serde::Serialize;
use ts_rs::TS;

pub use error::{ApiError, ErrorCode};

/// Successful command outcome.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        ApiResponse { status: 200, body }
    }

    pub fn created(body: T) -> Self {
        ApiResponse { status: 201, body }
    }
}

/// What every command returns.
pub type CommandResult<T> = Result<ApiResponse<T>, ApiError>;

/// Unwraps a filter the query cannot run without.
pub(crate) fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert_eq!(require(&Some(" Sinkor ".into()), "store").unwrap(), "Sinkor");
        assert_eq!(require(&None, "store").unwrap_err().status(), 400);
        assert_eq!(require(&Some("  ".into()), "store").unwrap_err().status(), 400);
    }
}
