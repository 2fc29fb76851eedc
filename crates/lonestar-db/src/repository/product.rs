//! # Product Repository
//!
//! Catalog entries and stock on hand.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ Check then write (two statements, races between them)          │
//! │     SELECT quantity ...;  -- 3 on hand, 2 wanted, ok               │
//! │     UPDATE products SET quantity = 1 ...                           │
//! │                                                                     │
//! │  ✅ Conditional delta (one statement)                              │
//! │     UPDATE products SET quantity = quantity - 2                    │
//! │     WHERE id = ? AND store = ? AND quantity >= 2                   │
//! │                                                                     │
//! │  rows_affected() == 0  →  not enough stock (or no such product)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//! Every stock change also refreshes `total_lrd_cents` (stock value).

use chrono::{DateTime, Utc};
use lonestar_core::validation::MAX_QUANTITY;
use lonestar_core::{ExchangeRate, Money, Product};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, store, name, quantity, price_usd_cents, price_lrd_cents, \
     total_lrd_cents, category, barcode, shelf_location, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    store: String,
    name: String,
    quantity: i64,
    price_usd_cents: Option<i64>,
    price_lrd_cents: i64,
    total_lrd_cents: Option<i64>,
    category: Option<String>,
    barcode: Option<String>,
    shelf_location: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            created_at: from_millis("product", row.created_at)?,
            updated_at: from_millis("product", row.updated_at)?,
            id: row.id,
            store: row.store,
            name: row.name,
            quantity: row.quantity,
            price_usd: row.price_usd_cents.map(Money::from_cents),
            price_lrd: Money::from_cents(row.price_lrd_cents),
            total_lrd: row.total_lrd_cents.map(Money::from_cents),
            category: row.category,
            barcode: row.barcode,
            shelf_location: row.shelf_location,
        })
    }
}

// =============================================================================
// Connection-level statements
// =============================================================================

pub(crate) async fn find(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
) -> DbResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND store = ?2"
    ))
    .bind(id)
    .bind(store)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}

pub(crate) async fn list_by_store(conn: &mut SqliteConnection, store: &str) -> DbResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE store = ?1 ORDER BY name, id"
    ))
    .bind(store)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Product::try_from).collect()
}

pub(crate) async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(store = %product.store, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, store, name, quantity,
            price_usd_cents, price_lrd_cents, total_lrd_cents,
            category, barcode, shelf_location,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&product.id)
    .bind(&product.store)
    .bind(&product.name)
    .bind(product.quantity)
    .bind(product.price_usd.map(|m| m.cents()))
    .bind(product.price_lrd.cents())
    .bind(product.total_lrd.map(|m| m.cents()))
    .bind(&product.category)
    .bind(&product.barcode)
    .bind(&product.shelf_location)
    .bind(to_millis(product.created_at))
    .bind(to_millis(product.updated_at))
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate("product name", &product.name),
        other => other,
    })?;

    Ok(())
}

/// Takes `qty` units if at least that many are on hand.
///
/// ## Returns
/// * `Ok(true)` - Stock decremented
/// * `Ok(false)` - Not enough stock, or no such product in the store
pub(crate) async fn decrement(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, store = %store, qty, "Decrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            quantity = quantity - ?3,
            total_lrd_cents = (quantity - ?3) * price_lrd_cents,
            updated_at = ?4
        WHERE id = ?1 AND store = ?2 AND quantity >= ?3
        "#,
    )
    .bind(id)
    .bind(store)
    .bind(qty)
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Puts `qty` units back on hand, never past [`MAX_QUANTITY`].
///
/// ## Returns
/// `Ok(false)` when no such product exists in the store, or when the new
/// stock level would pass the ceiling.
pub(crate) async fn increment(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, store = %store, qty, "Incrementing stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            quantity = quantity + ?3,
            total_lrd_cents = (quantity + ?3) * price_lrd_cents,
            updated_at = ?4
        WHERE id = ?1 AND store = ?2 AND quantity <= ?5
        "#,
    )
    .bind(id)
    .bind(store)
    .bind(qty)
    .bind(to_millis(now))
    .bind(MAX_QUANTITY.saturating_sub(qty))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Highest USD price in the catalog, across every store.
pub(crate) async fn max_usd_price(conn: &mut SqliteConnection) -> DbResult<Option<Money>> {
    let top: Option<i64> = sqlx::query_scalar("SELECT MAX(price_usd_cents) FROM products")
        .fetch_one(&mut *conn)
        .await?;
    Ok(top.map(Money::from_cents))
}

/// Re-derives LRD prices of every USD-priced product from `rate`.
///
/// Rounds half away from zero, the same as [`ExchangeRate::to_lrd`]; USD
/// prices are never negative so `+ 5000` then truncating division matches.
/// Products without a USD price are untouched.
///
/// ## Returns
/// Number of products repriced.
pub(crate) async fn reprice_for_rate(
    conn: &mut SqliteConnection,
    rate: ExchangeRate,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            price_lrd_cents = (price_usd_cents * ?1 + 5000) / 10000,
            total_lrd_cents = quantity * ((price_usd_cents * ?1 + 5000) / 10000),
            updated_at = ?2
        WHERE price_usd_cents IS NOT NULL
        "#,
    )
    .bind(rate.scaled())
    .bind(to_millis(now))
    .execute(&mut *conn)
    .await?;

    debug!(rate = %rate, repriced = result.rows_affected(), "Catalog repriced");
    Ok(result.rows_affected())
}

// =============================================================================
// Pool-backed repository
// =============================================================================

/// Read access to the catalog, plus direct inserts for seeding.
///
/// Stock changes go through [`crate::UnitOfWork`].
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by ID within a store.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No such product in this store
    pub async fn get(&self, id: &str, store: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id, store).await
    }

    /// Lists a store's products by name.
    pub async fn list_by_store(&self, store: &str) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        list_by_store(&mut conn, store).await
    }

    /// Inserts a product outside a unit of work.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already used in this store
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, product).await
    }

    /// Counts products in a store (for diagnostics and seeding).
    pub async fn count(&self, store: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store = ?1")
            .bind(store)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
