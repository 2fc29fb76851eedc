//! # lonestar-engine: Dual-Currency Transaction & Reporting Engine
//!
//! The operations a store front calls: sales, returns, restocks, credits,
//! the shared LRD/USD rate and sales reports.
//!
//! ## Module Organization
//! ```text
//! lonestar_engine/
//! ├── lib.rs          ◄─── You are here (Engine handle, tracing setup)
//! ├── config.rs       ◄─── EngineConfig (TOML + LONESTAR_* env)
//! ├── error.rs        ◄─── EngineError → ErrorKind
//! ├── currency.rs     ◄─── Current rate, rate update + catalog cascade
//! ├── inventory.rs    ◄─── Product registration and lookup
//! ├── sale.rs         ◄─── Sales, returns, restocks, transaction queries
//! ├── credit.rs       ◄─── Customer tabs and their settlement
//! ├── report.rs       ◄─── Sales report, top products
//! └── commands/       ◄─── Request/response contracts with status codes
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP layer (not in this workspace)                                     │
//! │       │  JSON body → NewSale                                            │
//! │       ▼                                                                 │
//! │  commands::sale::create_sale(&engine, request)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  engine.sales().create_sale(request)                                   │
//! │       │  validate → begin → take stock → settle → insert → commit      │
//! │       ▼                                                                 │
//! │  ApiResponse { status: 201, body: Transaction }                         │
//! │  or ApiError { code: "VALIDATION_ERROR", message } → 400               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! lonestar_engine::init_tracing();
//! let engine = Engine::connect(EngineConfig::load(None)?).await?;
//! let rate = engine.currency().get_current_rate().await?;
//! ```

pub mod commands;
pub mod config;
pub mod credit;
pub mod currency;
pub mod error;
pub mod inventory;
pub mod report;
pub mod sale;

use std::sync::Arc;

use lonestar_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::{ConfigError, EngineConfig};
pub use credit::{CreditService, PaidCredit};
pub use currency::{CurrencyService, RateUpdate};
pub use error::{EngineError, EngineResult};
pub use inventory::InventoryService;
pub use report::{ReportQuery, ReportService, StoreScope};
pub use sale::SaleService;

/// Handle to a running engine. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Wraps an open database. Fails if `config` does not validate.
    pub fn new(db: Database, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Engine {
            db,
            config: Arc::new(config),
        })
    }

    /// Opens the configured database file, runs migrations and builds the
    /// engine.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let db_config = config.db_config()?;
        info!(location = %db_config.location, "Starting engine");
        let db = Database::new(db_config).await?;
        Engine::new(db, config)
    }

    /// A private in-memory database, for tests and demos.
    pub async fn in_memory(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Engine::new(db, config)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn currency(&self) -> CurrencyService {
        CurrencyService::new(self.db.clone(), self.config.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone(), self.config.clone())
    }

    pub fn sales(&self) -> SaleService {
        SaleService::new(self.db.clone(), self.config.clone())
    }

    pub fn credits(&self) -> CreditService {
        CreditService::new(self.db.clone(), self.config.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.clone(), self.config.clone())
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=lonestar=trace` - Show trace for lonestar crates only
/// - Default: INFO, DEBUG for lonestar crates, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lonestar=debug,sqlx=warn"));

    // try_init: a host application may already have installed a subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
