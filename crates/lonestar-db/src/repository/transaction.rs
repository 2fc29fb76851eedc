//! # Transaction Repository
//!
//! Sales, restocks and returns. Rows are inserted once and never updated.
//!
//! ## Storage Layout
//! ```text
//! transactions                      transaction_items
//! ┌──────────────────────────┐      ┌────────────────────────────────────┐
//! │ id, kind, store,         │ 1──n │ transaction_id, position,          │
//! │ currency, totals,        │      │ product_id, product_name,          │
//! │ received, change, rate,  │      │ quantity, unit prices (snapshots)  │
//! │ reason, created_at (ms)  │      └────────────────────────────────────┘
//! └──────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use lonestar_core::{Currency, ExchangeRate, Money, Transaction, TransactionKind};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{from_millis, insert_items, load_items, to_millis, TRANSACTION_ITEMS};
use crate::error::{DbError, DbResult};

const TRANSACTION_COLUMNS: &str = "id, kind, store, currency, amount_received_lrd_cents, \
     amount_received_usd_cents, change_cents, change_currency, total_lrd_cents, total_usd_cents, \
     exchange_rate_scaled, reason, original_transaction_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    kind: TransactionKind,
    store: String,
    currency: Currency,
    amount_received_lrd_cents: i64,
    amount_received_usd_cents: i64,
    change_cents: i64,
    change_currency: Currency,
    total_lrd_cents: i64,
    total_usd_cents: i64,
    exchange_rate_scaled: Option<i64>,
    reason: Option<String>,
    original_transaction_id: Option<String>,
    created_at: i64,
}

impl TransactionRow {
    fn into_transaction(self, items: Vec<lonestar_core::LineItem>) -> DbResult<Transaction> {
        let exchange_rate = self
            .exchange_rate_scaled
            .map(ExchangeRate::from_scaled)
            .transpose()
            .map_err(|e| DbError::corrupt("transaction", e.to_string()))?;

        Ok(Transaction {
            created_at: from_millis("transaction", self.created_at)?,
            id: self.id,
            kind: self.kind,
            store: self.store,
            currency: self.currency,
            items,
            amount_received_lrd: Money::from_cents(self.amount_received_lrd_cents),
            amount_received_usd: Money::from_cents(self.amount_received_usd_cents),
            change: Money::from_cents(self.change_cents),
            change_currency: self.change_currency,
            total_lrd: Money::from_cents(self.total_lrd_cents),
            total_usd: Money::from_cents(self.total_usd_cents),
            exchange_rate,
            reason: self.reason,
            original_transaction_id: self.original_transaction_id,
        })
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Which transactions to list. Unset fields do not filter.
///
/// Results are always newest first, ties by id.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub store: Option<String>,
    pub kind: Option<TransactionKind>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    /// Only transactions with at least one line for this product.
    pub product_id: Option<String>,
    pub limit: Option<u32>,
}

impl TransactionFilter {
    pub fn store(store: impl Into<String>) -> Self {
        TransactionFilter {
            store: Some(store.into()),
            ..Default::default()
        }
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Connection-level statements
// =============================================================================

pub(crate) async fn insert(conn: &mut SqliteConnection, tx: &Transaction) -> DbResult<()> {
    debug!(id = %tx.id, kind = tx.kind.as_str(), store = %tx.store, "Inserting transaction");

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, kind, store, currency,
            amount_received_lrd_cents, amount_received_usd_cents,
            change_cents, change_currency,
            total_lrd_cents, total_usd_cents, exchange_rate_scaled,
            reason, original_transaction_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&tx.id)
    .bind(tx.kind)
    .bind(&tx.store)
    .bind(tx.currency)
    .bind(tx.amount_received_lrd.cents())
    .bind(tx.amount_received_usd.cents())
    .bind(tx.change.cents())
    .bind(tx.change_currency)
    .bind(tx.total_lrd.cents())
    .bind(tx.total_usd.cents())
    .bind(tx.exchange_rate.map(|r| r.scaled()))
    .bind(&tx.reason)
    .bind(&tx.original_transaction_id)
    .bind(to_millis(tx.created_at))
    .execute(&mut *conn)
    .await?;

    insert_items(conn, TRANSACTION_ITEMS, &tx.id, &tx.items).await
}

pub(crate) async fn find(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
) -> DbResult<Option<Transaction>> {
    let row: Option<TransactionRow> = sqlx::query_as(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1 AND store = ?2"
    ))
    .bind(id)
    .bind(store)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut items = load_items(conn, TRANSACTION_ITEMS, std::slice::from_ref(&row.id)).await?;
    let lines = items.remove(&row.id).unwrap_or_default();
    row.into_transaction(lines).map(Some)
}

pub(crate) async fn find_many(
    conn: &mut SqliteConnection,
    filter: &TransactionFilter,
) -> DbResult<Vec<Transaction>> {
    let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS}
        FROM transactions t
        WHERE (?1 IS NULL OR t.store = ?1)
          AND (?2 IS NULL OR t.kind = ?2)
          AND (?3 IS NULL OR t.created_at >= ?3)
          AND (?4 IS NULL OR t.created_at <= ?4)
          AND (?5 IS NULL OR EXISTS (
                SELECT 1 FROM transaction_items i
                WHERE i.transaction_id = t.id AND i.product_id = ?5))
        ORDER BY t.created_at DESC, t.id ASC
        LIMIT ?6
        "#
    ))
    .bind(&filter.store)
    .bind(filter.kind)
    .bind(filter.from.map(to_millis))
    .bind(filter.to.map(to_millis))
    .bind(&filter.product_id)
    .bind(filter.limit.map(i64::from).unwrap_or(-1))
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut items = load_items(conn, TRANSACTION_ITEMS, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            row.into_transaction(lines)
        })
        .collect()
}

// =============================================================================
// Pool-backed repository
// =============================================================================

/// Read access to stored transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction by ID within a store.
    pub async fn get(&self, id: &str, store: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id, store).await
    }

    /// Lists transactions matching `filter`, newest first, lines included.
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        let found = find_many(&mut conn, filter).await?;
        debug!(count = found.len(), "Listed transactions");
        Ok(found)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{generate_id, Database, DbConfig};
    use chrono::TimeDelta;
    use lonestar_core::LineItem;

    pub(crate) fn sale(store: &str, product_id: &str, qty: i64, at: DateTime<Utc>) -> Transaction {
        let line = LineItem {
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            quantity: qty,
            unit_price_lrd: Money::from_cents(1_000),
            unit_price_usd: Money::from_cents(5),
        };
        Transaction {
            id: generate_id(),
            kind: TransactionKind::Sale,
            store: store.to_string(),
            currency: Currency::Both,
            total_lrd: line.line_total_lrd(),
            total_usd: line.line_total_usd(),
            items: vec![line],
            amount_received_lrd: Money::from_cents(500),
            amount_received_usd: Money::from_cents(300),
            change: Money::from_cents(10),
            change_currency: Currency::Lrd,
            exchange_rate: Some(ExchangeRate::from_decimal(197.0).unwrap()),
            reason: None,
            original_transaction_id: None,
            created_at: at,
        }
    }

    async fn store_all(db: &Database, txs: &[Transaction]) {
        let mut conn = db.pool().acquire().await.unwrap();
        for tx in txs {
            insert(&mut conn, tx).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = sale("Sinkor", "rice", 2, Utc::now());
        tx.items.push(LineItem {
            product_id: "oil".to_string(),
            product_name: "Palm Oil".to_string(),
            quantity: 1,
            unit_price_lrd: Money::from_cents(45_000),
            unit_price_usd: Money::zero(),
        });
        store_all(&db, std::slice::from_ref(&tx)).await;

        let loaded = db.transactions().get(&tx.id, "Sinkor").await.unwrap().unwrap();
        assert_eq!(loaded.items, tx.items);
        assert_eq!(loaded.exchange_rate, tx.exchange_rate);
        assert_eq!(loaded.currency, Currency::Both);
        assert!(db.transactions().get(&tx.id, "Paynesville").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let base = Utc::now() - TimeDelta::days(3);
        let old = sale("Sinkor", "rice", 1, base);
        let mid = sale("Sinkor", "oil", 1, base + TimeDelta::days(1));
        let new = sale("Sinkor", "rice", 1, base + TimeDelta::days(2));
        let elsewhere = sale("Paynesville", "rice", 1, base + TimeDelta::days(2));
        let mut ret = sale("Sinkor", "rice", 1, base + TimeDelta::days(2));
        ret.kind = TransactionKind::Return;
        store_all(&db, &[old.clone(), mid.clone(), new.clone(), elsewhere, ret]).await;

        let repo = db.transactions();

        let sinkor_sales = repo
            .list(&TransactionFilter::store("Sinkor").kind(TransactionKind::Sale))
            .await
            .unwrap();
        let ids: Vec<_> = sinkor_sales.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![new.id.clone(), mid.id.clone(), old.id.clone()]);

        let limited = repo.list(&TransactionFilter::store("Sinkor").limit(2)).await.unwrap();
        assert_eq!(limited.len(), 2);

        let ranged = repo
            .list(&TransactionFilter::store("Sinkor").between(
                Some(base + TimeDelta::hours(12)),
                Some(base + TimeDelta::days(1)),
            ))
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, mid.id);

        let by_rice = repo
            .list(&TransactionFilter::store("Sinkor").product("rice"))
            .await
            .unwrap();
        assert_eq!(by_rice.len(), 3);

        let everywhere = repo
            .list(&TransactionFilter::default().kind(TransactionKind::Sale))
            .await
            .unwrap();
        assert_eq!(everywhere.len(), 4);
    }
}
