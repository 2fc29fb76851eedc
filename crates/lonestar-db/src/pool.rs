//! # Database Handle
//!
//! ```text
//! DbConfig::new(path) / DbConfig::in_memory()
//!      │
//!      ▼
//! Database::new ── open pool ── run embedded migrations
//!      │
//!      ├──► products() / transactions() / credits() / currency_rates()
//!      │        reads, one pooled connection per call
//!      │
//!      └──► begin() → UnitOfWork
//!               writes, one connection, one SQLite transaction
//! ```
//!
//! File databases run in WAL mode with NORMAL sync and foreign keys on, so a
//! report can read while a checkout writes.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::credit::CreditRepository;
use crate::repository::currency::CurrencyRateRepository;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::TransactionRepository;
use crate::unit_of_work::UnitOfWork;

/// Where the store's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to the pool; gone when the pool closes.
    Memory,
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => f.write_str(":memory:"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Default: 5. Always 1 in memory.
    pub max_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// A database file, created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Every connection to `:memory:` is its own database, so the pool is
    /// pinned to one connection that is never recycled.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        if self.location != DbLocation::Memory {
            self.max_connections = max.max(1);
        }
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.location {
            DbLocation::Memory => SqliteConnectOptions::new().in_memory(true),
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(self.acquire_timeout)
                .create_if_missing(true),
        };
        options.foreign_keys(true)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(self.acquire_timeout);
        match self.location {
            DbLocation::Memory => options.idle_timeout(None).max_lifetime(None),
            DbLocation::File(_) => options.idle_timeout(Duration::from_secs(600)),
        }
    }
}

/// Shared handle over the pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", config.location)))?;
        info!(
            location = %config.location,
            max_connections = config.max_connections,
            "Database opened"
        );

        let db = Database { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Applies pending migrations. Safe to call again.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn currency_rates(&self) -> CurrencyRateRepository {
        CurrencyRateRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn credits(&self) -> CreditRepository {
        CreditRepository::new(self.pool.clone())
    }

    /// Opens a unit of work: one SQLite transaction on one connection.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so concurrent
    /// units of work queue behind each other and each one reads stock and
    /// credit status as the previous one left it.
    ///
    /// Dropping it without [`UnitOfWork::commit`] rolls everything back.
    /// On a single-connection pool (in memory) the repositories block until
    /// it is done, so read through the unit of work instead.
    pub async fn begin(&self) -> DbResult<UnitOfWork> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(UnitOfWork::new(tx))
    }

    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[test]
    fn test_max_connections() {
        assert_eq!(DbConfig::new("/tmp/lonestar.db").max_connections(10).max_connections, 10);
        assert_eq!(DbConfig::new("/tmp/lonestar.db").max_connections(0).max_connections, 1);
        assert_eq!(DbConfig::in_memory().max_connections(10).max_connections, 1);
        assert_eq!(DbConfig::in_memory().location.to_string(), ":memory:");
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let path = std::env::temp_dir().join(format!("lonestar-{}.db", uuid::Uuid::new_v4()));
        {
            let db = Database::new(DbConfig::new(&path)).await.unwrap();
            assert!(db.health_check().await);
            db.close().await;
        }
        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let (total, applied) = crate::migrations::migration_status(reopened.pool())
            .await
            .unwrap();
        assert_eq!(total, applied);
        reopened.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
