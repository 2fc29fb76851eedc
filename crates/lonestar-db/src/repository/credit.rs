//! # Credit Repository
//!
//! Customer tabs. A credit is inserted `pending` and flipped to `paid` exactly
//! once, by a conditional update.

use chrono::{DateTime, Utc};
use lonestar_core::{Credit, CreditStatus, Currency, LineItem, Money};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{from_millis, insert_items, load_items, to_millis, CREDIT_ITEMS};
use crate::error::DbResult;

const CREDIT_COLUMNS: &str = "id, store, customer_name, total_lrd_cents, total_usd_cents, \
     status, preferred_currency, created_at, paid_at, payment_transaction_id";

#[derive(Debug, sqlx::FromRow)]
struct CreditRow {
    id: String,
    store: String,
    customer_name: String,
    total_lrd_cents: i64,
    total_usd_cents: i64,
    status: CreditStatus,
    preferred_currency: Currency,
    created_at: i64,
    paid_at: Option<i64>,
    payment_transaction_id: Option<String>,
}

impl CreditRow {
    fn into_credit(self, items: Vec<LineItem>) -> DbResult<Credit> {
        Ok(Credit {
            created_at: from_millis("credit", self.created_at)?,
            paid_at: self.paid_at.map(|ms| from_millis("credit", ms)).transpose()?,
            id: self.id,
            store: self.store,
            customer_name: self.customer_name,
            items,
            total_lrd: Money::from_cents(self.total_lrd_cents),
            total_usd: Money::from_cents(self.total_usd_cents),
            status: self.status,
            preferred_currency: self.preferred_currency,
            payment_transaction_id: self.payment_transaction_id,
        })
    }
}

/// Which credits to list. Newest first.
#[derive(Debug, Clone, Default)]
pub struct CreditFilter {
    pub store: Option<String>,
    pub status: Option<CreditStatus>,
    /// Exact match on the stored (trimmed) name.
    pub customer_name: Option<String>,
}

impl CreditFilter {
    pub fn store(store: impl Into<String>) -> Self {
        CreditFilter {
            store: Some(store.into()),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: Option<CreditStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }
}

// =============================================================================
// Connection-level statements
// =============================================================================

pub(crate) async fn insert(conn: &mut SqliteConnection, credit: &Credit) -> DbResult<()> {
    debug!(id = %credit.id, store = %credit.store, customer = %credit.customer_name, "Inserting credit");

    sqlx::query(
        r#"
        INSERT INTO credits (
            id, store, customer_name, total_lrd_cents, total_usd_cents,
            status, preferred_currency, created_at, paid_at, payment_transaction_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&credit.id)
    .bind(&credit.store)
    .bind(&credit.customer_name)
    .bind(credit.total_lrd.cents())
    .bind(credit.total_usd.cents())
    .bind(credit.status)
    .bind(credit.preferred_currency)
    .bind(to_millis(credit.created_at))
    .bind(credit.paid_at.map(to_millis))
    .bind(&credit.payment_transaction_id)
    .execute(&mut *conn)
    .await?;

    insert_items(conn, CREDIT_ITEMS, &credit.id, &credit.items).await
}

pub(crate) async fn find(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
) -> DbResult<Option<Credit>> {
    let row: Option<CreditRow> = sqlx::query_as(&format!(
        "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1 AND store = ?2"
    ))
    .bind(id)
    .bind(store)
    .fetch_optional(&mut *conn)
    .await?;

    hydrate_one(conn, row).await
}

/// Like [`find`] but only matches a credit that is still pending.
pub(crate) async fn find_pending(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
) -> DbResult<Option<Credit>> {
    let row: Option<CreditRow> = sqlx::query_as(&format!(
        "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1 AND store = ?2 AND status = 'pending'"
    ))
    .bind(id)
    .bind(store)
    .fetch_optional(&mut *conn)
    .await?;

    hydrate_one(conn, row).await
}

async fn hydrate_one(
    conn: &mut SqliteConnection,
    row: Option<CreditRow>,
) -> DbResult<Option<Credit>> {
    let Some(row) = row else {
        return Ok(None);
    };
    let mut items = load_items(conn, CREDIT_ITEMS, std::slice::from_ref(&row.id)).await?;
    let lines = items.remove(&row.id).unwrap_or_default();
    row.into_credit(lines).map(Some)
}

/// Flips a pending credit to paid.
///
/// ## Returns
/// `Ok(false)` if the credit is missing or was already paid.
pub(crate) async fn mark_paid(
    conn: &mut SqliteConnection,
    id: &str,
    store: &str,
    paid_at: DateTime<Utc>,
    payment_transaction_id: &str,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE credits
        SET status = 'paid', paid_at = ?3, payment_transaction_id = ?4
        WHERE id = ?1 AND store = ?2 AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(store)
    .bind(to_millis(paid_at))
    .bind(payment_transaction_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn find_many(
    conn: &mut SqliteConnection,
    filter: &CreditFilter,
) -> DbResult<Vec<Credit>> {
    let rows: Vec<CreditRow> = sqlx::query_as(&format!(
        r#"
        SELECT {CREDIT_COLUMNS}
        FROM credits
        WHERE (?1 IS NULL OR store = ?1)
          AND (?2 IS NULL OR status = ?2)
          AND (?3 IS NULL OR customer_name = ?3)
        ORDER BY created_at DESC, id ASC
        "#
    ))
    .bind(&filter.store)
    .bind(filter.status)
    .bind(&filter.customer_name)
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut items = load_items(conn, CREDIT_ITEMS, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            row.into_credit(lines)
        })
        .collect()
}

// =============================================================================
// Pool-backed repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    pub async fn get(&self, id: &str, store: &str) -> DbResult<Option<Credit>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id, store).await
    }

    pub async fn list(&self, filter: &CreditFilter) -> DbResult<Vec<Credit>> {
        let mut conn = self.pool.acquire().await?;
        find_many(&mut conn, filter).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::transaction;
    use crate::{generate_id, Database, DbConfig};
    use chrono::TimeDelta;

    pub(crate) fn tab(store: &str, customer: &str, lrd: i64, at: DateTime<Utc>) -> Credit {
        Credit {
            id: generate_id(),
            store: store.to_string(),
            customer_name: customer.to_string(),
            items: vec![LineItem {
                product_id: "rice".to_string(),
                product_name: "Rice 25kg".to_string(),
                quantity: 1,
                unit_price_lrd: Money::from_cents(lrd),
                unit_price_usd: Money::zero(),
            }],
            total_lrd: Money::from_cents(lrd),
            total_usd: Money::zero(),
            status: CreditStatus::Pending,
            preferred_currency: Currency::Lrd,
            created_at: at,
            paid_at: None,
            payment_transaction_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_find_and_mark_paid_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let credit = tab("Sinkor", "Musu Kamara", 150_000, Utc::now());
        let payment = transaction::tests::sale("Sinkor", "rice", 1, Utc::now());

        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &credit).await.unwrap();
        transaction::insert(&mut conn, &payment).await.unwrap();

        let pending = find_pending(&mut conn, &credit.id, "Sinkor").await.unwrap().unwrap();
        assert_eq!(pending.items, credit.items);
        assert!(find_pending(&mut conn, &credit.id, "Paynesville").await.unwrap().is_none());

        let now = Utc::now();
        assert!(mark_paid(&mut conn, &credit.id, "Sinkor", now, &payment.id).await.unwrap());
        assert!(!mark_paid(&mut conn, &credit.id, "Sinkor", now, &payment.id).await.unwrap());
        assert!(find_pending(&mut conn, &credit.id, "Sinkor").await.unwrap().is_none());

        let paid = find(&mut conn, &credit.id, "Sinkor").await.unwrap().unwrap();
        assert_eq!(paid.status, CreditStatus::Paid);
        assert_eq!(paid.payment_transaction_id.as_deref(), Some(payment.id.as_str()));
        assert_eq!(paid.paid_at.map(|t| t.timestamp_millis()), Some(now.timestamp_millis()));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let base = Utc::now();
        let a = tab("Sinkor", "Musu Kamara", 100, base);
        let b = tab("Sinkor", "Jallah Flomo", 200, base + TimeDelta::seconds(1));
        let mut c = tab("Sinkor", "Musu Kamara", 300, base + TimeDelta::seconds(2));
        c.status = CreditStatus::Paid;
        c.paid_at = Some(base);
        let d = tab("Paynesville", "Musu Kamara", 400, base);

        let mut conn = db.pool().acquire().await.unwrap();
        for credit in [&a, &b, &c, &d] {
            insert(&mut conn, credit).await.unwrap();
        }
        drop(conn);

        let repo = db.credits();
        let all = repo.list(&CreditFilter::store("Sinkor")).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![c.id.clone(), b.id.clone(), a.id.clone()]);

        let pending = repo
            .list(&CreditFilter::store("Sinkor").status(Some(CreditStatus::Pending)))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let musu = repo
            .list(&CreditFilter::store("Sinkor").customer("Musu Kamara"))
            .await
            .unwrap();
        assert_eq!(musu.len(), 2);
    }
}
