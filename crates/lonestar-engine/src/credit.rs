//! # Credit (Tab) Engine
//!
//! A credit takes goods off the shelf now and money later.
//!
//! ```text
//! create_credit ──► Credit { status: pending }     stock already decremented
//!                         │
//!                         │ pay_credit (same payment rules as a sale)
//!                         ▼
//!                   Credit { status: paid, paid_at, payment_transaction_id }
//!                         │
//!                         └──► Transaction { kind: sale, items + totals of the credit }
//! ```
//!
//! `pending → paid` is the only transition and happens at most once.

use std::sync::Arc;

use lonestar_core::payment::settle;
use lonestar_core::period;
use lonestar_core::validation::{
    validate_customer_name, validate_lines, validate_preferred_currency, validate_store,
};
use lonestar_core::{
    CoreError, Credit, CreditBalance, CreditPayment, CreditStatus, NewCredit, Totals, Transaction,
    TransactionKind, ValidationError,
};
use lonestar_db::{generate_id, CreditFilter, Database};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::currency::payment_rate;
use crate::error::EngineResult;
use crate::sale::{new_transaction, take_lines, validate_supplied_totals};

/// A settled credit and the sale that settled it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaidCredit {
    pub credit: Credit,
    pub transaction: Transaction,
}

#[derive(Debug, Clone)]
pub struct CreditService {
    db: Database,
    config: Arc<EngineConfig>,
}

impl CreditService {
    pub fn new(db: Database, config: Arc<EngineConfig>) -> Self {
        CreditService { db, config }
    }

    /// Opens a tab. Stock is taken immediately; no payment is checked.
    pub async fn create_credit(&self, request: NewCredit) -> EngineResult<Credit> {
        let store = validate_store(&request.store)?;
        let customer_name = validate_customer_name(&request.customer_name)?;
        let preferred_currency = validate_preferred_currency(request.preferred_currency)?;
        validate_lines(&request.items, false)?;
        validate_supplied_totals(request.total_lrd, request.total_usd)?;

        let mut uow = self.db.begin().await?;
        let items = take_lines(&mut uow, &store, &request.items).await?;
        let totals = Totals::of(&items)?.or_supplied(request.total_lrd, request.total_usd);

        let credit = Credit {
            id: generate_id(),
            store,
            customer_name,
            items,
            total_lrd: totals.lrd,
            total_usd: totals.usd,
            status: CreditStatus::Pending,
            preferred_currency,
            created_at: period::now(),
            paid_at: None,
            payment_transaction_id: None,
        };
        uow.insert_credit(&credit).await?;
        uow.commit().await?;

        info!(
            id = %credit.id,
            store = %credit.store,
            customer = %credit.customer_name,
            total_lrd = %credit.total_lrd,
            "Credit opened"
        );
        Ok(credit)
    }

    /// Settles a pending credit with a sale carrying its lines and totals.
    ///
    /// ## Errors
    /// - `NotFound`: no such credit in the store, or it is already paid
    /// - `Validation`: payment missing or short
    pub async fn pay_credit(&self, request: CreditPayment) -> EngineResult<PaidCredit> {
        let store = validate_store(&request.store)?;
        let credit_id = request.credit_id.trim();
        if credit_id.is_empty() {
            return Err(ValidationError::required("creditId").into());
        }
        let rate = payment_rate(request.currency, request.exchange_rate, &self.config)?;

        let not_found = || CoreError::CreditNotFound {
            id: credit_id.to_string(),
            store: store.clone(),
        };

        let mut uow = self.db.begin().await?;
        let mut credit = uow
            .find_pending_credit(credit_id, &store)
            .await?
            .ok_or_else(not_found)?;

        let settlement = settle(&request.tender(), credit.totals(), rate).inspect_err(|e| {
            warn!(credit = %credit.id, error = %e, "Credit payment rejected");
        })?;

        let tx = new_transaction(
            TransactionKind::Sale,
            store.clone(),
            request.currency,
            credit.items.clone(),
            credit.totals(),
            settlement,
        );
        uow.insert_transaction(&tx).await?;

        let paid_at = tx.created_at;
        if !uow.mark_credit_paid(&credit.id, &store, paid_at, &tx.id).await? {
            warn!(credit = %credit.id, "Credit was settled concurrently");
            return Err(not_found().into());
        }
        uow.commit().await?;

        credit.status = CreditStatus::Paid;
        credit.paid_at = Some(paid_at);
        credit.payment_transaction_id = Some(tx.id.clone());

        info!(credit = %credit.id, transaction = %tx.id, store = %store, "Credit paid");
        Ok(PaidCredit {
            credit,
            transaction: tx,
        })
    }

    /// Newest first, optionally only one status.
    pub async fn get_by_store(&self, store: &str, status: Option<CreditStatus>) -> EngineResult<Vec<Credit>> {
        let filter = CreditFilter::store(validate_store(store)?).status(status);
        Ok(self.db.credits().list(&filter).await?)
    }

    pub async fn get_by_id(&self, id: &str, store: &str) -> EngineResult<Credit> {
        let store = validate_store(store)?;
        match self.db.credits().get(id, &store).await? {
            Some(credit) => Ok(credit),
            None => Err(CoreError::CreditNotFound {
                id: id.to_string(),
                store,
            }
            .into()),
        }
    }

    /// Every credit of one customer in the store, matched on the trimmed
    /// name.
    pub async fn get_by_customer(&self, store: &str, customer_name: &str) -> EngineResult<Vec<Credit>> {
        let filter =
            CreditFilter::store(validate_store(store)?).customer(validate_customer_name(customer_name)?);
        Ok(self.db.credits().list(&filter).await?)
    }

    /// Pending vs paid totals plus what each customer still owes.
    pub async fn balance(&self, store: &str) -> EngineResult<CreditBalance> {
        let credits = self.get_by_store(store, None).await?;
        Ok(CreditBalance::from_credits(&credits))
    }
}
