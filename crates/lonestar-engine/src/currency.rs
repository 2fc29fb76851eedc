//! # Currency Rate Store
//!
//! One shared LRD-per-USD rate. Changing it reprices every USD-priced
//! product in the same database transaction.
//!
//! ```text
//! update_rate(199.5)
//!      │
//!      ▼
//! BEGIN
//!   currency_rates.rate  = 199.5
//!   products.price_lrd   = round(price_usd × 199.5)   (USD-priced only)
//!   products.total_lrd   = quantity × price_lrd
//! COMMIT
//! ```

use std::sync::Arc;

use lonestar_core::validation::validate_price;
use lonestar_core::{Currency, CurrencyRate, ExchangeRate};
use lonestar_db::Database;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Result of a rate change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    pub rate: CurrencyRate,
    pub products_repriced: u64,
}

#[derive(Debug, Clone)]
pub struct CurrencyService {
    db: Database,
    config: Arc<EngineConfig>,
}

impl CurrencyService {
    pub fn new(db: Database, config: Arc<EngineConfig>) -> Self {
        CurrencyService { db, config }
    }

    /// The stored rate, created from `currency.default_rate` on first read.
    pub async fn get_current_rate(&self) -> EngineResult<CurrencyRate> {
        let default = self.config.default_rate()?;
        Ok(self.db.currency_rates().current(default).await?)
    }

    /// Replaces the rate and cascades it over the catalog.
    pub async fn update_rate(&self, new_rate: f64) -> EngineResult<RateUpdate> {
        let rate = ExchangeRate::from_decimal(new_rate)?;

        let mut uow = self.db.begin().await?;
        // Every repriced LRD price must stay a valid price
        if let Some(top) = uow.max_usd_price().await? {
            validate_price("priceLrd", rate.to_lrd(top))?;
        }
        let stored = uow.set_rate(rate).await?;
        let products_repriced = uow.reprice_for_rate(rate).await?;
        uow.commit().await?;

        info!(rate = %rate, products_repriced, "Exchange rate updated");
        Ok(RateUpdate {
            rate: stored,
            products_repriced,
        })
    }
}

/// The rate applied to a `BOTH` payment: the caller's, else the configured
/// fallback. Single-currency payments get `None` and any requested rate is
/// ignored unparsed.
pub(crate) fn payment_rate(
    currency: Currency,
    requested: Option<f64>,
    config: &EngineConfig,
) -> EngineResult<Option<ExchangeRate>> {
    if currency != Currency::Both {
        return Ok(None);
    }
    match requested {
        Some(rate) => Ok(Some(ExchangeRate::from_decimal(rate)?)),
        None => Ok(Some(config.fallback_rate()?)),
    }
}
