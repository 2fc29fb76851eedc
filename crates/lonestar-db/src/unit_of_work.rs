//! # Unit of Work
//!
//! One SQLite transaction spanning every write of a single order.
//!
//! ```text
//! let mut uow = db.begin().await?;         BEGIN
//! uow.take_stock(rice, 2).await?;          UPDATE products ... quantity >= 2
//! uow.take_stock(oil, 1).await?;           UPDATE products ... quantity >= 1
//! uow.insert_transaction(&tx).await?;      INSERT transactions + items
//! uow.commit().await?;                     COMMIT
//!
//! Any `?` above drops `uow` → ROLLBACK, nothing was applied.
//! ```

use chrono::{DateTime, Utc};
use lonestar_core::period::now;
use lonestar_core::{Credit, CurrencyRate, ExchangeRate, Money, Product, Transaction};
use sqlx::{Sqlite, Transaction as SqlTransaction};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{credit, currency, product, transaction};

/// An open database transaction. Commit it or drop it.
pub struct UnitOfWork {
    tx: SqlTransaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: SqlTransaction<'static, Sqlite>) -> Self {
        debug!("Unit of work opened");
        UnitOfWork { tx }
    }

    // -------------------------------------------------------------------------
    // Inventory ledger
    // -------------------------------------------------------------------------

    pub async fn find_product(&mut self, id: &str, store: &str) -> DbResult<Option<Product>> {
        product::find(&mut *self.tx, id, store).await
    }

    /// Decrements stock only if enough is on hand. `false` means nothing
    /// changed.
    pub async fn take_stock(&mut self, id: &str, store: &str, qty: i64) -> DbResult<bool> {
        product::decrement(&mut *self.tx, id, store, qty, now()).await
    }

    pub async fn return_stock(&mut self, id: &str, store: &str, qty: i64) -> DbResult<bool> {
        product::increment(&mut *self.tx, id, store, qty, now()).await
    }

    pub async fn insert_product(&mut self, p: &Product) -> DbResult<()> {
        product::insert(&mut *self.tx, p).await
    }

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    pub async fn insert_transaction(&mut self, tx: &Transaction) -> DbResult<()> {
        transaction::insert(&mut *self.tx, tx).await
    }

    pub async fn insert_credit(&mut self, c: &Credit) -> DbResult<()> {
        credit::insert(&mut *self.tx, c).await
    }

    pub async fn find_pending_credit(&mut self, id: &str, store: &str) -> DbResult<Option<Credit>> {
        credit::find_pending(&mut *self.tx, id, store).await
    }

    /// `false` when another payment got there first.
    pub async fn mark_credit_paid(
        &mut self,
        id: &str,
        store: &str,
        paid_at: DateTime<Utc>,
        payment_transaction_id: &str,
    ) -> DbResult<bool> {
        credit::mark_paid(&mut *self.tx, id, store, paid_at, payment_transaction_id).await
    }

    // -------------------------------------------------------------------------
    // Exchange rate
    // -------------------------------------------------------------------------

    pub async fn current_rate(&mut self, default: ExchangeRate) -> DbResult<CurrencyRate> {
        currency::get_or_init(&mut *self.tx, default, now()).await
    }

    pub async fn set_rate(&mut self, rate: ExchangeRate) -> DbResult<CurrencyRate> {
        currency::set(&mut *self.tx, rate, now()).await
    }

    pub async fn max_usd_price(&mut self) -> DbResult<Option<Money>> {
        product::max_usd_price(&mut *self.tx).await
    }

    /// Recomputes LRD prices of USD-priced products. Returns how many changed.
    pub async fn reprice_for_rate(&mut self, rate: ExchangeRate) -> DbResult<u64> {
        product::reprice_for_rate(&mut *self.tx, rate, now()).await
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        debug!("Unit of work committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::product::tests::sample;
    use crate::{Database, DbConfig};
    use lonestar_core::{ExchangeRate, Money};

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let rice = sample("Sinkor", "Rice 25kg", 5, 197_000, None);
        db.products().insert(&rice).await.unwrap();

        {
            let mut uow = db.begin().await.unwrap();
            assert!(uow.take_stock(&rice.id, "Sinkor", 3).await.unwrap());
            // dropped without commit
        }

        let after = db.products().get(&rice.id, "Sinkor").await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
    }

    #[tokio::test]
    async fn test_commit_applies_stock_and_rate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let soap = sample("Sinkor", "Soap", 4, 197, Some(100));
        db.products().insert(&soap).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        assert!(uow.take_stock(&soap.id, "Sinkor", 4).await.unwrap());
        assert!(!uow.take_stock(&soap.id, "Sinkor", 1).await.unwrap());
        let rate = ExchangeRate::from_decimal(200.0).unwrap();
        uow.set_rate(rate).await.unwrap();
        assert_eq!(uow.reprice_for_rate(rate).await.unwrap(), 1);
        uow.commit().await.unwrap();

        let after = db.products().get(&soap.id, "Sinkor").await.unwrap().unwrap();
        assert_eq!(after.quantity, 0);
        assert_eq!(after.price_lrd, Money::from_cents(20_000));
        assert_eq!(db.currency_rates().current(rate).await.unwrap().rate, rate);
    }
}
