//! # Request Shapes
//!
//! What callers hand to the engine. Everything here is plain data; the
//! engine validates it with [`crate::validation`] before touching stock.
//!
//! Wire format is camelCase JSON, e.g. a mixed-currency sale:
//! ```json
//! {
//!   "store": "Paynesville",
//!   "currency": "BOTH",
//!   "items": [{ "productId": "6f0c...", "quantity": 2 }],
//!   "amountReceivedLrd": 50000,
//!   "amountReceivedUsd": 300,
//!   "totalLrd": 100000,
//!   "exchangeRate": 197.0
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::Currency;
use crate::money::Money;
use crate::payment::Tender;

/// A requested line: which product and how many units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub store: String,
    pub currency: Currency,
    #[serde(default)]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub amount_received_lrd: Option<Money>,
    #[serde(default)]
    pub amount_received_usd: Option<Money>,
    /// Only honoured for `BOTH`; otherwise change is in the sale currency.
    #[serde(default)]
    pub change_currency: Option<Currency>,
    /// Defaults to the sum of line totals.
    #[serde(default)]
    pub total_lrd: Option<Money>,
    /// Defaults to the sum of line totals.
    #[serde(default)]
    pub total_usd: Option<Money>,
    /// LRD per USD for a `BOTH` payment. Falls back to the configured rate.
    #[serde(default)]
    pub exchange_rate: Option<f64>,
}

impl NewSale {
    pub fn tender(&self) -> Tender {
        Tender {
            currency: self.currency,
            received_lrd: self.amount_received_lrd,
            received_usd: self.amount_received_usd,
            change_currency: self.change_currency,
        }
    }
}

// =============================================================================
// Return / Restock
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewReturn {
    pub store: String,
    #[serde(default)]
    pub items: Vec<LineRequest>,
    /// Recorded on the return; defaults to LRD.
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub original_transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewRestock {
    pub store: String,
    #[serde(default)]
    pub items: Vec<LineRequest>,
}

// =============================================================================
// Credit
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCredit {
    pub store: String,
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub total_lrd: Option<Money>,
    #[serde(default)]
    pub total_usd: Option<Money>,
    pub preferred_currency: Currency,
}

/// Settles a pending credit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditPayment {
    pub credit_id: String,
    pub store: String,
    pub currency: Currency,
    #[serde(default)]
    pub amount_received_lrd: Option<Money>,
    #[serde(default)]
    pub amount_received_usd: Option<Money>,
    #[serde(default)]
    pub change_currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
}

impl CreditPayment {
    pub fn tender(&self) -> Tender {
        Tender {
            currency: self.currency,
            received_lrd: self.amount_received_lrd,
            received_usd: self.amount_received_usd,
            change_currency: self.change_currency,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Registers a product in a store.
///
/// Either price may be given. With a USD price, the LRD price is derived
/// from the current rate and any `price_lrd` sent along is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub store: String,
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price_usd: Option<Money>,
    #[serde(default)]
    pub price_lrd: Option<Money>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub shelf_location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_from_json() {
        let sale: NewSale = serde_json::from_str(
            r#"{
                "store": "Paynesville",
                "currency": "BOTH",
                "items": [{ "productId": "p1", "quantity": 2 }],
                "amountReceivedLrd": 50000,
                "amountReceivedUsd": 300,
                "totalLrd": 100000,
                "exchangeRate": 197.0
            }"#,
        )
        .unwrap();

        assert_eq!(sale.items, vec![LineRequest::new("p1", 2)]);
        assert_eq!(sale.total_usd, None);
        let tender = sale.tender();
        assert_eq!(tender.currency, Currency::Both);
        assert_eq!(tender.received_usd, Some(Money::from_cents(300)));
    }

    #[test]
    fn test_return_defaults() {
        let ret: NewReturn = serde_json::from_str(r#"{ "store": "Sinkor" }"#).unwrap();
        assert!(ret.items.is_empty());
        assert!(ret.reason.is_none());
    }
}
