//! # Transaction Engine
//!
//! Sales, returns and restocks, plus the transaction queries.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(NewSale)                                                   │
//! │       │                                                                 │
//! │       ├── validate store + lines         (nothing touched yet)         │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       ├── per line: find → check → conditional decrement → snapshot    │
//! │       ├── totals: caller's, else sum of snapshots                      │
//! │       ├── settle payment (LRD | USD | BOTH at effective rate)          │
//! │       ├── insert transaction + lines                                   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error between BEGIN and COMMIT rolls back every decrement.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use lonestar_core::payment::settle;
use lonestar_core::period;
use lonestar_core::validation::{
    clamp_limit, validate_lines, validate_price, validate_store, MAX_QUANTITY,
};
use lonestar_core::{
    CoreError, Currency, DateRange, LineItem, LineRequest, Money, NewRestock, NewReturn, NewSale,
    Settlement, Totals, Transaction, TransactionKind, ValidationError, DEFAULT_RETURN_REASON,
};
use lonestar_db::{generate_id, Database, TransactionFilter, UnitOfWork};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::currency::payment_rate;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    config: Arc<EngineConfig>,
}

impl SaleService {
    pub fn new(db: Database, config: Arc<EngineConfig>) -> Self {
        SaleService { db, config }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sells the requested lines and records the payment.
    ///
    /// ## Errors
    /// - `Validation`: bad store or line, short stock, short or missing payment
    /// - `NotFound`: a product is not in this store
    pub async fn create_sale(&self, request: NewSale) -> EngineResult<Transaction> {
        let store = validate_store(&request.store)?;
        validate_lines(&request.items, false)?;
        validate_supplied_totals(request.total_lrd, request.total_usd)?;
        let rate = payment_rate(request.currency, request.exchange_rate, &self.config)?;

        let mut uow = self.db.begin().await?;
        let items = take_lines(&mut uow, &store, &request.items).await?;
        let totals = Totals::of(&items)?.or_supplied(request.total_lrd, request.total_usd);

        let settlement = settle(&request.tender(), totals, rate).inspect_err(|e| {
            warn!(store = %store, error = %e, "Sale payment rejected");
        })?;

        let tx = new_transaction(TransactionKind::Sale, store, request.currency, items, totals, settlement);
        uow.insert_transaction(&tx).await?;
        uow.commit().await?;

        info!(
            id = %tx.id,
            store = %tx.store,
            currency = %tx.currency,
            total_lrd = %tx.total_lrd,
            total_usd = %tx.total_usd,
            "Sale recorded"
        );
        Ok(tx)
    }

    /// Puts returned units back on the shelf and records a `return`.
    ///
    /// Totals use the product's *current* catalog price, not what the
    /// customer originally paid.
    pub async fn create_return(&self, request: NewReturn) -> EngineResult<Transaction> {
        let store = validate_store(&request.store)?;
        validate_lines(&request.items, true)?;

        let mut uow = self.db.begin().await?;
        let items = put_back_lines(&mut uow, &store, &request.items).await?;
        let totals = Totals::of(&items)?;
        let currency = request.currency.unwrap_or(Currency::Lrd);

        let mut tx = new_transaction(
            TransactionKind::Return,
            store,
            currency,
            items,
            totals,
            Settlement::none(currency),
        );
        tx.reason = Some(
            request
                .reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_RETURN_REASON.to_string()),
        );
        tx.original_transaction_id = request.original_transaction_id.filter(|id| !id.trim().is_empty());

        uow.insert_transaction(&tx).await?;
        uow.commit().await?;

        info!(id = %tx.id, store = %tx.store, items = tx.item_count(), total_lrd = %tx.total_lrd, "Return recorded");
        Ok(tx)
    }

    /// Receives stock from a supplier and records a `restock` valued at
    /// catalog prices. Restocks never appear in sales reports.
    pub async fn create_restock(&self, request: NewRestock) -> EngineResult<Transaction> {
        let store = validate_store(&request.store)?;
        validate_lines(&request.items, true)?;

        let mut uow = self.db.begin().await?;
        let items = put_back_lines(&mut uow, &store, &request.items).await?;
        let totals = Totals::of(&items)?;

        let tx = new_transaction(
            TransactionKind::Restock,
            store,
            Currency::Lrd,
            items,
            totals,
            Settlement::none(Currency::Lrd),
        );
        uow.insert_transaction(&tx).await?;
        uow.commit().await?;

        info!(id = %tx.id, store = %tx.store, items = tx.item_count(), "Restock recorded");
        Ok(tx)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Newest first. `None` returns the whole history; a limit is kept
    /// within `1..=MAX_PAGE_SIZE`.
    pub async fn get_by_store(&self, store: &str, limit: Option<u32>) -> EngineResult<Vec<Transaction>> {
        let filter = TransactionFilter::store(validate_store(store)?);
        match clamp_limit(limit) {
            Some(limit) => self.list(filter.limit(limit)).await,
            None => self.list(filter).await,
        }
    }

    pub async fn get_by_id(&self, id: &str, store: &str) -> EngineResult<Transaction> {
        let store = validate_store(store)?;
        match self.db.transactions().get(id, &store).await? {
            Some(tx) => Ok(tx),
            None => Err(CoreError::TransactionNotFound {
                id: id.to_string(),
                store,
            }
            .into()),
        }
    }

    /// Everything recorded on one local calendar day.
    pub async fn get_by_date(&self, store: &str, date: NaiveDate) -> EngineResult<Vec<Transaction>> {
        self.get_by_date_range(store, DateRange::day(date)).await
    }

    /// Whole local days, `from` 00:00:00.000 through `to` 23:59:59.999.
    pub async fn get_by_date_range(&self, store: &str, range: DateRange) -> EngineResult<Vec<Transaction>> {
        let store = validate_store(store)?;
        let (from, to) = range.bounds(&Local)?;
        self.list(TransactionFilter::store(store).between(from, to)).await
    }

    /// Transactions with at least one line for the product, newest first.
    pub async fn get_by_product(&self, store: &str, product_id: &str) -> EngineResult<Vec<Transaction>> {
        let store = validate_store(store)?;
        if product_id.trim().is_empty() {
            return Err(ValidationError::required("productId").into());
        }
        self.list(TransactionFilter::store(store).product(product_id.trim()))
            .await
    }

    async fn list(&self, filter: TransactionFilter) -> EngineResult<Vec<Transaction>> {
        let found = self.db.transactions().list(&filter).await?;
        debug!(store = ?filter.store, count = found.len(), "Transactions fetched");
        Ok(found)
    }
}

// =============================================================================
// Shared line handling
// =============================================================================

/// Decrements stock for each line in order and snapshots the product.
///
/// Stops at the first failure; the caller's unit of work then rolls back
/// whatever was already taken.
pub(crate) async fn take_lines(
    uow: &mut UnitOfWork,
    store: &str,
    lines: &[LineRequest],
) -> EngineResult<Vec<LineItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let product = uow
            .find_product(&line.product_id, store)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound {
                id: line.product_id.clone(),
                store: store.to_string(),
            })?;

        let short = || -> EngineError {
            CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.quantity,
                requested: line.quantity,
            }
            .into()
        };

        if !product.can_take(line.quantity) {
            warn!(store = %store, product = %product.name, available = product.quantity, requested = line.quantity, "Insufficient stock");
            return Err(short());
        }
        if !uow.take_stock(&product.id, store, line.quantity).await? {
            warn!(store = %store, product = %product.name, "Stock changed underneath the sale");
            return Err(short());
        }
        items.push(LineItem::snapshot(&product, line.quantity));
    }
    Ok(items)
}

/// Increments stock for each line and snapshots the current catalog price.
async fn put_back_lines(
    uow: &mut UnitOfWork,
    store: &str,
    lines: &[LineRequest],
) -> EngineResult<Vec<LineItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let not_found = || CoreError::ProductNotFound {
            id: line.product_id.clone(),
            store: store.to_string(),
        };
        let product = uow
            .find_product(&line.product_id, store)
            .await?
            .ok_or_else(not_found)?;
        if product.quantity > MAX_QUANTITY - line.quantity {
            warn!(store = %store, product = %product.name, on_hand = product.quantity, adding = line.quantity, "Stock ceiling reached");
            return Err(ValidationError::out_of_range("quantity", MAX_QUANTITY).into());
        }
        if !uow.return_stock(&product.id, store, line.quantity).await? {
            return Err(not_found().into());
        }
        items.push(LineItem::snapshot(&product, line.quantity));
    }
    Ok(items)
}

pub(crate) fn validate_supplied_totals(lrd: Option<Money>, usd: Option<Money>) -> EngineResult<()> {
    if let Some(lrd) = lrd {
        validate_price("totalLrd", lrd)?;
    }
    if let Some(usd) = usd {
        validate_price("totalUsd", usd)?;
    }
    Ok(())
}

/// A new transaction stamped now, with no reason or back-reference.
pub(crate) fn new_transaction(
    kind: TransactionKind,
    store: String,
    currency: Currency,
    items: Vec<LineItem>,
    totals: Totals,
    settlement: Settlement,
) -> Transaction {
    Transaction {
        id: generate_id(),
        kind,
        store,
        currency,
        items,
        amount_received_lrd: settlement.amount_received_lrd,
        amount_received_usd: settlement.amount_received_usd,
        change: settlement.change,
        change_currency: settlement.change_currency,
        total_lrd: totals.lrd,
        total_usd: totals.usd,
        exchange_rate: settlement.exchange_rate,
        reason: None,
        original_transaction_id: None,
        created_at: period::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
