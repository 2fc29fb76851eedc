//! # Credit Commands
//!
//! ```text
//! POST /credits                create_credit   201
//! POST /credits/:id/pay        pay_credit      200 | 400 | 404
//! GET  /credits?store=&status= list_credits    200 | 400
//! GET  /credits/balance?store= credit_balance  200 | 400
//! ```

use lonestar_core::{Credit, CreditBalance, CreditPayment, CreditStatus, NewCredit};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{require, ApiResponse, CommandResult};
use crate::credit::PaidCredit;
use crate::Engine;

/// Credits of one store, optionally one status or one customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditQuery {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub status: Option<CreditStatus>,
    /// Exact match on the trimmed name. Ignores `status` when set.
    #[serde(default)]
    pub customer_name: Option<String>,
}

pub async fn create_credit(engine: &Engine, request: NewCredit) -> CommandResult<Credit> {
    let credit = engine.credits().create_credit(request).await?;
    Ok(ApiResponse::created(credit))
}

pub async fn pay_credit(engine: &Engine, request: CreditPayment) -> CommandResult<PaidCredit> {
    let paid = engine.credits().pay_credit(request).await?;
    Ok(ApiResponse::ok(paid))
}

pub async fn list_credits(engine: &Engine, query: CreditQuery) -> CommandResult<Vec<Credit>> {
    let store = require(&query.store, "store")?;
    let credits = match query.customer_name.as_deref() {
        Some(customer) => engine.credits().get_by_customer(store, customer).await?,
        None => engine.credits().get_by_store(store, query.status).await?,
    };
    Ok(ApiResponse::ok(credits))
}

pub async fn credit_balance(engine: &Engine, store: Option<String>) -> CommandResult<CreditBalance> {
    let store = require(&store, "store")?;
    let balance = engine.credits().balance(store).await?;
    Ok(ApiResponse::ok(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::tests::stocked;
    use crate::EngineConfig;
    use lonestar_core::{Currency, LineRequest, Money};

    #[tokio::test]
    async fn test_credit_commands() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();
        let rice = stocked(&engine, "Rice", 5, 100_000, None).await;

        let created = create_credit(
            &engine,
            NewCredit {
                store: "Sinkor".into(),
                customer_name: "Musu Kamara".into(),
                items: vec![LineRequest::new(&rice.id, 1)],
                total_lrd: None,
                total_usd: None,
                preferred_currency: Currency::Lrd,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.status, 201);

        let payment = CreditPayment {
            credit_id: created.body.id.clone(),
            store: "Sinkor".into(),
            currency: Currency::Lrd,
            amount_received_lrd: Some(Money::from_cents(100_000)),
            amount_received_usd: None,
            change_currency: None,
            exchange_rate: None,
        };
        let paid = pay_credit(&engine, payment.clone()).await.unwrap();
        assert_eq!(paid.status, 200);
        assert_eq!(pay_credit(&engine, payment).await.unwrap_err().status(), 404);

        let by_customer = CreditQuery {
            store: Some("Sinkor".into()),
            customer_name: Some("Musu Kamara".into()),
            ..Default::default()
        };
        assert_eq!(list_credits(&engine, by_customer).await.unwrap().body.len(), 1);

        let pending = CreditQuery {
            store: Some("Sinkor".into()),
            status: Some(CreditStatus::Pending),
            ..Default::default()
        };
        assert!(list_credits(&engine, pending).await.unwrap().body.is_empty());

        let balance = credit_balance(&engine, Some("Sinkor".into())).await.unwrap();
        assert_eq!(balance.body.paid.count, 1);

        assert_eq!(credit_balance(&engine, None).await.unwrap_err().status(), 400);
        assert_eq!(
            list_credits(&engine, CreditQuery::default()).await.unwrap_err().status(),
            400
        );
    }
}
