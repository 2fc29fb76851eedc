//! # Reporting Aggregator
//!
//! Fetches sale and return history for a scope and range, then hands it to
//! the pure folds in `lonestar_core::report`.
//!
//! ```text
//! ReportQuery { scope, range }
//!      │
//!      ├── sales   = transactions(kind = sale,   scope, range)
//!      ├── returns = transactions(kind = return, scope, range)
//!      ▼
//! SalesReport::build(sales, returns, Local, recent_limit)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use lonestar_core::report::rank_top_products;
use lonestar_core::validation::validate_store;
use lonestar_core::{DateRange, SalesReport, TopProduct, Transaction, TransactionKind};
use lonestar_db::{Database, TransactionFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Which stores a report covers.
///
/// JSON: `{ "store": "Sinkor" }` or `"allStores"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum StoreScope {
    Store(String),
    AllStores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub scope: StoreScope,
    #[serde(default)]
    pub range: DateRange,
}

impl ReportQuery {
    pub fn store(store: impl Into<String>, range: DateRange) -> Self {
        ReportQuery {
            scope: StoreScope::Store(store.into()),
            range,
        }
    }

    pub fn all_stores(range: DateRange) -> Self {
        ReportQuery {
            scope: StoreScope::AllStores,
            range,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    config: Arc<EngineConfig>,
}

impl ReportService {
    pub fn new(db: Database, config: Arc<EngineConfig>) -> Self {
        ReportService { db, config }
    }

    /// Sales net of returns, rolled up by day, product and store.
    ///
    /// Restocks are not part of it. Repeating a query over unchanged data
    /// yields an identical report.
    pub async fn generate_sales_report(&self, query: ReportQuery) -> EngineResult<SalesReport> {
        query.range.validate()?;
        let store = match &query.scope {
            StoreScope::Store(name) => Some(validate_store(name)?),
            StoreScope::AllStores => None,
        };

        let sales = self.fetch(store.clone(), TransactionKind::Sale, query.range).await?;
        let returns = self.fetch(store, TransactionKind::Return, query.range).await?;
        debug!(sales = sales.len(), returns = returns.len(), "Building sales report");

        Ok(SalesReport::build(
            &sales,
            &returns,
            &Local,
            self.config.reporting.recent_limit as usize,
        ))
    }

    /// Best sellers by units in one store, named as the catalog names them
    /// today.
    pub async fn top_products(&self, store: &str, range: DateRange) -> EngineResult<Vec<TopProduct>> {
        let store = validate_store(store)?;
        range.validate()?;

        let sales = self.fetch(Some(store.clone()), TransactionKind::Sale, range).await?;
        let mut top = rank_top_products(&sales, self.config.reporting.top_products_limit as usize);

        let catalog: HashMap<String, String> = self
            .db
            .products()
            .list_by_store(&store)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        for entry in &mut top {
            // Deleted products keep their snapshot name
            if let Some(name) = catalog.get(&entry.product_id) {
                entry.product_name = name.clone();
            }
        }
        Ok(top)
    }

    async fn fetch(
        &self,
        store: Option<String>,
        kind: TransactionKind,
        range: DateRange,
    ) -> EngineResult<Vec<Transaction>> {
        let (from, to) = range.bounds(&Local)?;
        let filter = TransactionFilter {
            store,
            ..Default::default()
        }
        .kind(kind)
        .between(from, to);
        Ok(self.db.transactions().list(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::tests::{lrd_sale, stocked};
    use crate::Engine;
    use lonestar_core::{ErrorKind, LineRequest, Money, NewReturn};

    #[tokio::test]
    async fn test_report_nets_returns_and_is_repeatable() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let rice = stocked(&engine, "Rice", 20, 10_000, None).await;
        let oil = stocked(&engine, "Oil", 20, 5_000, None).await;
        let sales = engine.sales();

        sales
            .create_sale(lrd_sale(vec![LineRequest::new(&rice.id, 3)], 30_000))
            .await
            .unwrap();
        sales
            .create_sale(lrd_sale(vec![LineRequest::new(&oil.id, 1)], 5_000))
            .await
            .unwrap();
        sales
            .create_return(NewReturn {
                store: "Sinkor".into(),
                items: vec![LineRequest::new(&rice.id, 1)],
                currency: None,
                reason: Some("Torn bag".into()),
                original_transaction_id: None,
            })
            .await
            .unwrap();

        let query = ReportQuery::store("Sinkor", DateRange::all());
        let report = engine.reports().generate_sales_report(query.clone()).await.unwrap();

        assert_eq!(report.summary.sales, 2);
        assert_eq!(report.summary.returns, 1);
        assert_eq!(report.summary.total_lrd, Money::from_cents(25_000));
        assert_eq!(report.summary.items_sold, 3);
        assert_eq!(report.summary.store_count, 1);
        assert_eq!(report.products[0].product_name, "Rice");
        assert_eq!(report.products[0].items, 2);
        assert_eq!(report.recent.len(), 3);

        let again = engine.reports().generate_sales_report(query).await.unwrap();
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            serde_json::to_string(&again).unwrap()
        );

        let elsewhere = engine
            .reports()
            .generate_sales_report(ReportQuery::store("Paynesville", DateRange::all()))
            .await
            .unwrap();
        assert_eq!(elsewhere.summary.sales, 0);
    }

    #[tokio::test]
    async fn test_top_products_order_and_names() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let a = stocked(&engine, "A", 50, 100, None).await;
        let b = stocked(&engine, "B", 50, 100, None).await;
        let c = stocked(&engine, "C", 50, 100, None).await;

        for (product, qty) in [(&a, 5), (&b, 10), (&c, 3)] {
            engine
                .sales()
                .create_sale(lrd_sale(vec![LineRequest::new(&product.id, qty)], 10_000))
                .await
                .unwrap();
        }

        let top = engine
            .reports()
            .top_products("Sinkor", DateRange::all())
            .await
            .unwrap();
        let ranked: Vec<_> = top.iter().map(|t| (t.product_name.as_str(), t.quantity)).collect();
        assert_eq!(ranked, vec![("B", 10), ("A", 5), ("C", 3)]);
        assert_eq!(top[0].revenue_lrd, Money::from_cents(1_000));
    }

    #[tokio::test]
    async fn test_rejects_blank_store_scope() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let err = engine
            .reports()
            .generate_sales_report(ReportQuery::store(" ", DateRange::all()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let all = engine
            .reports()
            .generate_sales_report(ReportQuery::all_stores(DateRange::all()))
            .await
            .unwrap();
        assert!(all.daily.is_empty());
    }

    #[tokio::test]
    async fn test_reports_reject_unreachable_days() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let range = DateRange::day(chrono::NaiveDate::MAX);

        let err = engine
            .reports()
            .generate_sales_report(ReportQuery::all_stores(range))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = engine.reports().top_products("Sinkor", range).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
