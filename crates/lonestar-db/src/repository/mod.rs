//! # Repository Module
//!
//! Database repository implementations for Lonestar POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  Reads                              Writes                              │
//! │  ─────                              ──────                              │
//! │  db.transactions().list(&filter)    let mut uow = db.begin().await?;    │
//! │       │                             uow.take_stock(..).await?;          │
//! │       │ acquires a pooled conn      uow.insert_transaction(..).await?;  │
//! │       ▼                             uow.commit().await?;                │
//! │  transaction::find_many(conn, ..)         │                             │
//! │                                           ▼                             │
//! │                                     product::decrement(conn, ..)        │
//! │                                     transaction::insert(conn, ..)       │
//! │                                                                         │
//! │  Each module owns its SQL as free functions over &mut SqliteConnection,│
//! │  so the same statement runs on a pooled connection or inside a         │
//! │  unit of work.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock
//! - [`CurrencyRateRepository`](currency::CurrencyRateRepository) - The shared rate
//! - [`TransactionRepository`](transaction::TransactionRepository) - Sales, restocks, returns
//! - [`CreditRepository`](credit::CreditRepository) - Customer tabs

pub mod credit;
pub mod currency;
pub mod product;
pub mod transaction;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lonestar_core::{LineItem, Money};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// SQLite caps bound parameters per statement; stay well under it.
const ITEM_LOAD_CHUNK: usize = 500;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(entity: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::corrupt(entity, format!("timestamp out of range: {millis}")))
}

// =============================================================================
// Line Items
// =============================================================================

/// Where a document's lines live: `transaction_items` or `credit_items`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemTable {
    pub table: &'static str,
    pub parent_column: &'static str,
}

pub(crate) const TRANSACTION_ITEMS: ItemTable = ItemTable {
    table: "transaction_items",
    parent_column: "transaction_id",
};

pub(crate) const CREDIT_ITEMS: ItemTable = ItemTable {
    table: "credit_items",
    parent_column: "credit_id",
};

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    parent_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_lrd_cents: i64,
    unit_price_usd_cents: i64,
}

impl From<ItemRow> for LineItem {
    fn from(row: ItemRow) -> Self {
        LineItem {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_lrd: Money::from_cents(row.unit_price_lrd_cents),
            unit_price_usd: Money::from_cents(row.unit_price_usd_cents),
        }
    }
}

/// Writes `items` in order under `parent_id`.
pub(crate) async fn insert_items(
    conn: &mut SqliteConnection,
    target: ItemTable,
    parent_id: &str,
    items: &[LineItem],
) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {} ({}, position, product_id, product_name, quantity, \
         unit_price_lrd_cents, unit_price_usd_cents) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        target.table, target.parent_column
    );
    for (position, item) in items.iter().enumerate() {
        sqlx::query(&sql)
            .bind(parent_id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_lrd.cents())
            .bind(item.unit_price_usd.cents())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Loads the lines of every parent in `parent_ids`, grouped and in position
/// order.
pub(crate) async fn load_items(
    conn: &mut SqliteConnection,
    target: ItemTable,
    parent_ids: &[String],
) -> DbResult<HashMap<String, Vec<LineItem>>> {
    let mut grouped: HashMap<String, Vec<LineItem>> = HashMap::with_capacity(parent_ids.len());

    for chunk in parent_ids.chunks(ITEM_LOAD_CHUNK) {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {parent} AS parent_id, product_id, product_name, quantity, \
             unit_price_lrd_cents, unit_price_usd_cents FROM {table} WHERE {parent} IN (",
            parent = target.parent_column,
            table = target.table,
        ));
        let mut ids = qb.separated(", ");
        for id in chunk {
            ids.push_bind(id);
        }
        ids.push_unseparated(format!(") ORDER BY {}, position", target.parent_column));

        let rows: Vec<ItemRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
        for row in rows {
            grouped
                .entry(row.parent_id.clone())
                .or_default()
                .push(LineItem::from(row));
        }
    }

    Ok(grouped)
}
