//! # Currency Rate Repository
//!
//! The one-row `currency_rates` table. The row is created lazily on first
//! read with whatever default the caller configures.

use chrono::{DateTime, Utc};
use lonestar_core::period::now;
use lonestar_core::{CurrencyRate, ExchangeRate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct RateRow {
    rate_scaled: i64,
    updated_at: i64,
}

impl TryFrom<RateRow> for CurrencyRate {
    type Error = DbError;

    fn try_from(row: RateRow) -> DbResult<Self> {
        Ok(CurrencyRate {
            rate: ExchangeRate::from_scaled(row.rate_scaled)
                .map_err(|e| DbError::corrupt("currency rate", e.to_string()))?,
            updated_at: from_millis("currency rate", row.updated_at)?,
        })
    }
}

/// Returns the stored rate, inserting `default` first if there is none.
pub(crate) async fn get_or_init(
    conn: &mut SqliteConnection,
    default: ExchangeRate,
    now: DateTime<Utc>,
) -> DbResult<CurrencyRate> {
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO currency_rates (id, rate_scaled, updated_at) VALUES (1, ?1, ?2)",
    )
    .bind(default.scaled())
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() == 1 {
        info!(rate = %default, "Initialized exchange rate");
    }

    let row: RateRow =
        sqlx::query_as("SELECT rate_scaled, updated_at FROM currency_rates WHERE id = 1")
            .fetch_one(&mut *conn)
            .await?;

    CurrencyRate::try_from(row)
}

/// Overwrites the rate and its timestamp.
pub(crate) async fn set(
    conn: &mut SqliteConnection,
    rate: ExchangeRate,
    now: DateTime<Utc>,
) -> DbResult<CurrencyRate> {
    debug!(rate = %rate, "Storing exchange rate");

    sqlx::query(
        r#"
        INSERT INTO currency_rates (id, rate_scaled, updated_at) VALUES (1, ?1, ?2)
        ON CONFLICT (id) DO UPDATE SET
            rate_scaled = excluded.rate_scaled,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(rate.scaled())
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;

    Ok(CurrencyRate {
        rate,
        updated_at: from_millis("currency rate", to_millis(now))?,
    })
}

/// Read access to the shared exchange rate.
///
/// Writes go through [`crate::UnitOfWork::set_rate`] so the catalog reprice
/// commits with them.
#[derive(Debug, Clone)]
pub struct CurrencyRateRepository {
    pool: SqlitePool,
}

impl CurrencyRateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CurrencyRateRepository { pool }
    }

    /// The current rate, initialised to `default` on first use.
    pub async fn current(&self, default: ExchangeRate) -> DbResult<CurrencyRate> {
        let mut conn = self.pool.acquire().await?;
        get_or_init(&mut conn, default, now()).await
    }
}
