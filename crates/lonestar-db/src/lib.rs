//! # lonestar-db: Storage Layer for Lonestar POS
//!
//! SQLite persistence for the catalog, the shared exchange rate, sales
//! history and customer credits.
//!
//! ```text
//! lonestar-engine
//!      │
//!      ├── reads ──────► Database::{products, transactions, credits, currency_rates}()
//!      │
//!      └── writes ─────► Database::begin() → UnitOfWork
//!                           take_stock / return_stock     conditional UPDATEs
//!                           insert_transaction / insert_credit
//!                           mark_credit_paid               pending → paid, once
//!                           set_rate + reprice_for_rate    catalog cascade
//!                           commit()                       or drop = rollback
//! ```
//!
//! Every SQL statement lives in `repository/*` as a free function over a
//! `SqliteConnection`, so the same query runs on a pooled connection or
//! inside a unit of work.
//!
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("lonestar.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! if !uow.take_stock(&product_id, "Sinkor", 2).await? {
//!     return Err(short_of_stock());
//! }
//! uow.insert_transaction(&sale).await?;
//! uow.commit().await?;
//!
//! let recent = db.transactions().list(&TransactionFilter::store("Sinkor").limit(20)).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use repository::credit::{CreditFilter, CreditRepository};
pub use repository::currency::CurrencyRateRepository;
pub use repository::generate_id;
pub use repository::product::ProductRepository;
pub use repository::transaction::{TransactionFilter, TransactionRepository};
pub use unit_of_work::UnitOfWork;
