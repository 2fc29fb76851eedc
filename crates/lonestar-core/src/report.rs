//! # Report Module
//!
//! Pure folds from transaction history to report structures. The engine
//! fetches the transactions; everything here is deterministic and I/O free.
//!
//! ## Sales Report Fold
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales ───┬──► daily   [local date]          + totals, + items, + tx   │
//! │           ├──► stores  [store]               + totals, + items, + tx   │
//! │           └──► products[(name, store)]       + line totals, + qty      │
//! │                                                                         │
//! │  returns ─┬──► daily                         − totals, − items, + ret  │
//! │           ├──► stores                        − totals, − items, + ret  │
//! │           └──► products                      − line totals, − qty      │
//! │                                                                         │
//! │  every bucket is clamped at zero, then sorted with full tie-breakers   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! BTreeMaps plus total orderings mean the same input always produces the
//! same output, byte for byte.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::{Currency, ExchangeRate};
use crate::money::Money;
use crate::period::local_day;
use crate::types::{Transaction, TransactionKind};

// =============================================================================
// Rollups
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyRollup {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_lrd: Money,
    pub total_usd: Money,
    pub transactions: u64,
    pub items: i64,
    pub returns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRollup {
    pub product_name: String,
    pub store: String,
    pub total_lrd: Money,
    pub total_usd: Money,
    /// Sales that carried the product, however many lines each.
    pub transactions: u64,
    /// Net units sold.
    pub items: i64,
    pub returns: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreRollup {
    pub store: String,
    pub total_lrd: Money,
    pub total_usd: Money,
    pub transactions: u64,
    pub items: i64,
    pub returns: u64,
}

/// A sale or return as listed in the report's recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    pub kind: TransactionKind,
    pub store: String,
    pub currency: Currency,
    pub total_lrd: Money,
    pub total_usd: Money,
    pub amount_received_lrd: Money,
    pub amount_received_usd: Money,
    pub change: Money,
    pub change_currency: Currency,
    #[ts(as = "Option<f64>")]
    pub exchange_rate: Option<ExchangeRate>,
    pub items: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for RecentActivity {
    fn from(tx: &Transaction) -> Self {
        RecentActivity {
            id: tx.id.clone(),
            kind: tx.kind,
            store: tx.store.clone(),
            currency: tx.currency,
            total_lrd: tx.total_lrd,
            total_usd: tx.total_usd,
            amount_received_lrd: tx.amount_received_lrd,
            amount_received_usd: tx.amount_received_usd,
            change: tx.change,
            change_currency: tx.change_currency,
            exchange_rate: tx.exchange_rate,
            items: tx.item_count(),
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub sales: u64,
    pub returns: u64,
    /// Net of returns, never below zero.
    pub total_lrd: Money,
    /// Net of returns, never below zero.
    pub total_usd: Money,
    /// Net of returned units, never below zero.
    pub items_sold: i64,
    pub returned_lrd: Money,
    pub returned_usd: Money,
    pub amount_received_lrd: Money,
    pub amount_received_usd: Money,
    pub change_lrd: Money,
    pub change_usd: Money,
    pub store_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub summary: SalesSummary,
    /// Date descending.
    pub daily: Vec<DailyRollup>,
    /// Net quantity descending.
    pub products: Vec<ProductRollup>,
    /// Transaction count descending.
    pub stores: Vec<StoreRollup>,
    /// Newest first.
    pub recent: Vec<RecentActivity>,
}

// =============================================================================
// Fold
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    total_lrd: Money,
    total_usd: Money,
    transactions: u64,
    items: i64,
    returns: u64,
}

impl Bucket {
    fn add_sale(&mut self, lrd: Money, usd: Money, items: i64) {
        self.total_lrd += lrd;
        self.total_usd += usd;
        self.items += items;
        self.transactions += 1;
    }

    fn sub_return(&mut self, lrd: Money, usd: Money, items: i64) {
        self.total_lrd -= lrd;
        self.total_usd -= usd;
        self.items -= items;
        self.returns += 1;
    }

    fn clamped(self) -> Self {
        Bucket {
            total_lrd: self.total_lrd.floor_zero(),
            total_usd: self.total_usd.floor_zero(),
            items: self.items.max(0),
            ..self
        }
    }
}

/// One transaction's lines summed per `(product name, store)`, so a product
/// on two lines of the same document still counts as one transaction.
fn lines_by_product(tx: &Transaction) -> BTreeMap<(String, String), (Money, Money, i64)> {
    let mut grouped: BTreeMap<(String, String), (Money, Money, i64)> = BTreeMap::new();
    for line in &tx.items {
        let entry = grouped
            .entry((line.product_name.clone(), tx.store.clone()))
            .or_default();
        entry.0 += line.line_total_lrd();
        entry.1 += line.line_total_usd();
        entry.2 += line.quantity;
    }
    grouped
}

impl SalesReport {
    /// Folds sale-kind and return-kind transactions into a report.
    ///
    /// Days are calendar days in `tz`. Transactions of other kinds in either
    /// slice are ignored.
    pub fn build<Tz: TimeZone>(
        sales: &[Transaction],
        returns: &[Transaction],
        tz: &Tz,
        recent_limit: usize,
    ) -> Self {
        let sales: Vec<&Transaction> = sales
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Sale)
            .collect();
        let returns: Vec<&Transaction> = returns
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Return)
            .collect();

        let mut daily: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        let mut stores: BTreeMap<String, Bucket> = BTreeMap::new();
        let mut products: BTreeMap<(String, String), Bucket> = BTreeMap::new();
        let mut store_names: BTreeSet<&str> = BTreeSet::new();
        let mut summary = SalesSummary::default();

        for tx in &sales {
            let items = tx.item_count();
            daily
                .entry(local_day(tx.created_at, tz))
                .or_default()
                .add_sale(tx.total_lrd, tx.total_usd, items);
            stores
                .entry(tx.store.clone())
                .or_default()
                .add_sale(tx.total_lrd, tx.total_usd, items);
            for (key, (lrd, usd, qty)) in lines_by_product(tx) {
                products.entry(key).or_default().add_sale(lrd, usd, qty);
            }

            summary.sales += 1;
            summary.total_lrd += tx.total_lrd;
            summary.total_usd += tx.total_usd;
            summary.items_sold += items;
            summary.amount_received_lrd += tx.amount_received_lrd;
            summary.amount_received_usd += tx.amount_received_usd;
            match tx.change_currency {
                Currency::Usd => summary.change_usd += tx.change,
                _ => summary.change_lrd += tx.change,
            }
            store_names.insert(&tx.store);
        }

        for tx in &returns {
            let items = tx.item_count();
            daily
                .entry(local_day(tx.created_at, tz))
                .or_default()
                .sub_return(tx.total_lrd, tx.total_usd, items);
            stores
                .entry(tx.store.clone())
                .or_default()
                .sub_return(tx.total_lrd, tx.total_usd, items);
            for (key, (lrd, usd, qty)) in lines_by_product(tx) {
                products.entry(key).or_default().sub_return(lrd, usd, qty);
            }

            summary.returns += 1;
            summary.total_lrd -= tx.total_lrd;
            summary.total_usd -= tx.total_usd;
            summary.items_sold -= items;
            summary.returned_lrd += tx.total_lrd;
            summary.returned_usd += tx.total_usd;
            store_names.insert(&tx.store);
        }

        summary.total_lrd = summary.total_lrd.floor_zero();
        summary.total_usd = summary.total_usd.floor_zero();
        summary.items_sold = summary.items_sold.max(0);
        summary.store_count = store_names.len() as u64;

        // BTreeMap iteration is date ascending; reverse for newest first.
        let daily = daily
            .into_iter()
            .rev()
            .map(|(date, b)| {
                let b = b.clamped();
                DailyRollup {
                    date,
                    total_lrd: b.total_lrd,
                    total_usd: b.total_usd,
                    transactions: b.transactions,
                    items: b.items,
                    returns: b.returns,
                }
            })
            .collect();

        let mut products: Vec<ProductRollup> = products
            .into_iter()
            .map(|((product_name, store), b)| {
                let b = b.clamped();
                ProductRollup {
                    product_name,
                    store,
                    total_lrd: b.total_lrd,
                    total_usd: b.total_usd,
                    transactions: b.transactions,
                    items: b.items,
                    returns: b.returns,
                }
            })
            .collect();
        // Stable sort keeps the (name, store) order of the map for ties.
        products.sort_by_key(|p| Reverse(p.items));

        let mut stores: Vec<StoreRollup> = stores
            .into_iter()
            .map(|(store, b)| {
                let b = b.clamped();
                StoreRollup {
                    store,
                    total_lrd: b.total_lrd,
                    total_usd: b.total_usd,
                    transactions: b.transactions,
                    items: b.items,
                    returns: b.returns,
                }
            })
            .collect();
        stores.sort_by_key(|s| Reverse(s.transactions));

        let mut recent: Vec<&Transaction> = sales.iter().chain(returns.iter()).copied().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        let recent = recent
            .into_iter()
            .take(recent_limit)
            .map(RecentActivity::from)
            .collect();

        SalesReport {
            summary,
            daily,
            products,
            stores,
            recent,
        }
    }
}

// =============================================================================
// Top Products
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue_lrd: Money,
    pub revenue_usd: Money,
}

/// Groups sale lines by product id and ranks by units sold.
///
/// `product_name` is the snapshot from the newest sale line; callers with
/// catalog access replace it with the current name.
pub fn rank_top_products(sales: &[Transaction], limit: usize) -> Vec<TopProduct> {
    let mut by_product: BTreeMap<&str, (TopProduct, DateTime<Utc>)> = BTreeMap::new();

    for tx in sales.iter().filter(|tx| tx.kind == TransactionKind::Sale) {
        for line in &tx.items {
            let (entry, seen_at) = by_product.entry(&line.product_id).or_insert_with(|| {
                (
                    TopProduct {
                        product_id: line.product_id.clone(),
                        product_name: line.product_name.clone(),
                        quantity: 0,
                        revenue_lrd: Money::zero(),
                        revenue_usd: Money::zero(),
                    },
                    tx.created_at,
                )
            });
            entry.quantity += line.quantity;
            entry.revenue_lrd += line.line_total_lrd();
            entry.revenue_usd += line.line_total_usd();
            if tx.created_at > *seen_at {
                entry.product_name = line.product_name.clone();
                *seen_at = tx.created_at;
            }
        }
    }

    let mut ranked: Vec<TopProduct> = by_product.into_values().map(|(p, _)| p).collect();
    ranked.sort_by_key(|p| Reverse(p.quantity));
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Unit Tests
// =============================================================================
