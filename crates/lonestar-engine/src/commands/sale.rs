//! # Transaction Commands
//!
//! Sales, returns and restocks, plus the transaction history queries.
//!
//! ```text
//! POST /sales                    create_sale             201
//! POST /returns                  create_return           201
//! POST /restocks                 create_restock          201
//! GET  /transactions?store=      list_transactions       200 | 400
//! GET  /transactions/:id?store=  get_transaction         200 | 404
//! GET  /transactions/date?...    transactions_by_date    200 | 400
//! GET  /transactions/product?... transactions_by_product 200 | 400
//! ```

use chrono::NaiveDate;
use lonestar_core::{DateRange, NewRestock, NewReturn, NewSale, Transaction};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use super::{require, ApiError, ApiResponse, CommandResult};
use crate::Engine;

/// History of one store, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default)]
    pub store: Option<String>,
    /// Omit for the whole history.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// One calendar day, or a range of them.
///
/// `date` wins when both forms are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DateQuery {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

pub async fn create_sale(engine: &Engine, request: NewSale) -> CommandResult<Transaction> {
    let tx = engine.sales().create_sale(request).await?;
    Ok(ApiResponse::created(tx))
}

pub async fn create_return(engine: &Engine, request: NewReturn) -> CommandResult<Transaction> {
    let tx = engine.sales().create_return(request).await?;
    Ok(ApiResponse::created(tx))
}

pub async fn create_restock(engine: &Engine, request: NewRestock) -> CommandResult<Transaction> {
    let tx = engine.sales().create_restock(request).await?;
    Ok(ApiResponse::created(tx))
}

pub async fn list_transactions(engine: &Engine, query: TransactionQuery) -> CommandResult<Vec<Transaction>> {
    let store = require(&query.store, "store")?;
    let found = engine.sales().get_by_store(store, query.limit).await?;
    Ok(ApiResponse::ok(found))
}

pub async fn get_transaction(engine: &Engine, id: &str, store: Option<String>) -> CommandResult<Transaction> {
    let store = require(&store, "store")?;
    let tx = engine.sales().get_by_id(id, store).await?;
    Ok(ApiResponse::ok(tx))
}

pub async fn transactions_by_date(engine: &Engine, query: DateQuery) -> CommandResult<Vec<Transaction>> {
    let store = require(&query.store, "store")?;
    let range = match (query.date, query.from, query.to) {
        (Some(date), _, _) => DateRange::day(date),
        (None, None, None) => return Err(ApiError::missing("date")),
        (None, from, to) => DateRange::between(from, to),
    };
    debug!(store, ?range, "Transactions by date");

    let found = engine.sales().get_by_date_range(store, range).await?;
    Ok(ApiResponse::ok(found))
}

pub async fn transactions_by_product(engine: &Engine, query: ProductQuery) -> CommandResult<Vec<Transaction>> {
    let store = require(&query.store, "store")?;
    let product_id = require(&query.product_id, "productId")?;
    let found = engine.sales().get_by_product(store, product_id).await?;
    Ok(ApiResponse::ok(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ErrorCode;
    use crate::sale::tests::{lrd_sale, stocked};
    use crate::EngineConfig;
    use chrono::Local;
    use lonestar_core::LineRequest;

    #[tokio::test]
    async fn test_create_and_query() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let rice = stocked(&engine, "Rice", 10, 10_000, None).await;

        let created = create_sale(&engine, lrd_sale(vec![LineRequest::new(&rice.id, 2)], 20_000))
            .await
            .unwrap();
        assert_eq!(created.status, 201);

        let listed = list_transactions(
            &engine,
            TransactionQuery {
                store: Some("Sinkor".into()),
                limit: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.status, 200);
        assert_eq!(listed.body.len(), 1);

        let today = DateQuery {
            store: Some("Sinkor".into()),
            date: Some(Local::now().date_naive()),
            ..Default::default()
        };
        assert_eq!(transactions_by_date(&engine, today).await.unwrap().body.len(), 1);

        let by_product = ProductQuery {
            store: Some("Sinkor".into()),
            product_id: Some(rice.id.clone()),
        };
        assert_eq!(transactions_by_product(&engine, by_product).await.unwrap().body.len(), 1);

        let fetched = get_transaction(&engine, &created.body.id, Some("Sinkor".into()))
            .await
            .unwrap();
        assert_eq!(fetched.body, created.body);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();

        let missing_store = list_transactions(&engine, TransactionQuery::default())
            .await
            .unwrap_err();
        assert_eq!(missing_store.status(), 400);

        let no_date = DateQuery {
            store: Some("Sinkor".into()),
            ..Default::default()
        };
        assert_eq!(transactions_by_date(&engine, no_date).await.unwrap_err().status(), 400);

        let unknown = get_transaction(&engine, "nope", Some("Sinkor".into()))
            .await
            .unwrap_err();
        assert_eq!(unknown.code, ErrorCode::NotFound);
        assert_eq!(unknown.status(), 404);

        let ghost = create_sale(&engine, lrd_sale(vec![LineRequest::new("ghost", 1)], 0))
            .await
            .unwrap_err();
        assert_eq!(ghost.status(), 404);
    }
}
