//! # lonestar-core: Pure Business Logic for Lonestar POS
//!
//! Everything the dual-currency engine decides without touching storage:
//! money arithmetic, LRD/USD conversion, payment sufficiency, day boundaries
//! and the folds that turn transaction history into reports.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Lonestar POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP layer (external, not in this workspace)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands::*                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lonestar-engine                              │   │
//! │  │    sales, returns, credits, rate updates, reports               │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐  ┌────────────▼────────────────────┐  │
//! │  │ ★ lonestar-core (THIS) ★    │  │  lonestar-db                    │  │
//! │  │ money · currency · payment  │  │  SQLite repositories            │  │
//! │  │ period · report · balance   │  │  unit of work, migrations       │  │
//! │  └─────────────────────────────┘  └─────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer minor-unit money
//! - [`currency`] - Currency codes, exchange rate, rate record
//! - [`types`] - Products, line items, transactions, credits
//! - [`order`] - Request shapes accepted by the engine
//! - [`payment`] - Payment sufficiency and change
//! - [`period`] - Whole-day date ranges
//! - [`report`] - Sales report and top-product folds
//! - [`balance`] - Credit (tab) balances
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lonestar_core::{ExchangeRate, Money};
//!
//! let rate = ExchangeRate::from_decimal(197.0).unwrap();
//! let usd = Money::from_cents(300); // 3.00 USD
//! assert_eq!(rate.to_lrd(usd).cents(), 59_100); // 591.00 LRD
//! ```

pub mod balance;
pub mod currency;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod period;
pub mod report;
pub mod types;
pub mod validation;

pub use balance::{CreditBalance, CurrencyTotals, CustomerBalance, StatusTotals};
pub use currency::{Currency, CurrencyRate, ExchangeRate};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use order::{CreditPayment, LineRequest, NewCredit, NewProduct, NewRestock, NewReturn, NewSale};
pub use payment::{Settlement, Tender};
pub use period::DateRange;
pub use report::{
    DailyRollup, ProductRollup, RecentActivity, SalesReport, SalesSummary, StoreRollup, TopProduct,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rate used when the singleton rate record is first created and no
/// configuration overrides it (LRD per 1 USD).
pub const DEFAULT_LRD_PER_USD: f64 = 197.0;

/// Reason stored on a return when the caller gives none.
pub const DEFAULT_RETURN_REASON: &str = "Customer return";

/// Number of most-recent sales and returns listed in a sales report.
pub const RECENT_ACTIVITY_LIMIT: usize = 50;

/// Number of products returned by the top-products ranking.
pub const TOP_PRODUCTS_LIMIT: usize = 10;
