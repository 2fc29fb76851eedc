//! # Report Commands

use chrono::NaiveDate;
use lonestar_core::{DateRange, SalesReport, TopProduct};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{require, ApiResponse, CommandResult};
use crate::report::ReportQuery;
use crate::Engine;

/// Best sellers of one store over a range of days.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProductsQuery {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

pub async fn sales_report(engine: &Engine, query: ReportQuery) -> CommandResult<SalesReport> {
    let report = engine.reports().generate_sales_report(query).await?;
    Ok(ApiResponse::ok(report))
}

pub async fn top_products(engine: &Engine, query: TopProductsQuery) -> CommandResult<Vec<TopProduct>> {
    let store = require(&query.store, "store")?;
    let range = DateRange::between(query.from, query.to);
    let top = engine.reports().top_products(store, range).await?;
    Ok(ApiResponse::ok(top))
}
