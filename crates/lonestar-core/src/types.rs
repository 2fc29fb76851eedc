//! # Domain Types
//!
//! Core domain records used throughout Lonestar POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  Transaction    │   │     Credit      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  store          │   │  kind, store    │   │  customer_name  │       │
//! │  │  quantity       │   │  currency       │   │  status         │       │
//! │  │  price_lrd/usd  │   │  items ─────┐   │   │  items ─────┐   │       │
//! │  └─────────────────┘   └─────────────┼───┘   └─────────────┼───┘       │
//! │                                      ▼                     ▼            │
//! │                        ┌──────────────────────────────────────┐        │
//! │                        │  LineItem (snapshot of name/prices)  │        │
//! │                        └──────────────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Store Partitioning
//! Every record carries `store`, a case-sensitive partition key. Reads
//! always filter by it except in the explicit all-stores report scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::{Currency, ExchangeRate};
use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::MAX_AMOUNT;

// =============================================================================
// Product
// =============================================================================

/// A catalog entry with stock on hand in one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to.
    pub store: String,

    /// Display name, unique within the store.
    pub name: String,

    /// Units on hand. The engine never drives this below zero.
    pub quantity: i64,

    /// USD price. When present, `price_lrd` follows it on every rate update.
    pub price_usd: Option<Money>,

    /// LRD price.
    pub price_lrd: Money,

    /// Stock value in LRD (`quantity × price_lrd`).
    pub total_lrd: Option<Money>,

    pub category: Option<String>,
    pub barcode: Option<String>,
    pub shelf_location: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be taken from stock.
    pub fn can_take(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    /// Stock value at the current LRD price.
    pub fn stock_value_lrd(&self) -> Money {
        self.price_lrd.times(self.quantity)
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Goods leave the store against payment.
    Sale,
    /// Goods enter the store.
    Restock,
    /// Goods come back from a customer.
    Return,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Restock => "restock",
            TransactionKind::Return => "return",
        }
    }
}

// =============================================================================
// Credit Status
// =============================================================================

/// Lifecycle of a credit: `Pending` → `Paid`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Pending,
    Paid,
}

impl CreditStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Pending => "pending",
            CreditStatus::Paid => "paid",
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product line on a sale, return, restock or credit.
/// Uses the snapshot pattern: name and prices are frozen at the moment the
/// line is applied, so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    /// Product name at time of transaction (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// LRD unit price at time of transaction (frozen).
    pub unit_price_lrd: Money,
    /// USD unit price at time of transaction (frozen, zero if unpriced).
    pub unit_price_usd: Money,
}

impl LineItem {
    /// Freezes a product's current name and prices into a line.
    pub fn snapshot(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price_lrd: product.price_lrd,
            unit_price_usd: product.price_usd.unwrap_or_default(),
        }
    }

    #[inline]
    pub fn line_total_lrd(&self) -> Money {
        self.unit_price_lrd.times(self.quantity)
    }

    #[inline]
    pub fn line_total_usd(&self) -> Money {
        self.unit_price_usd.times(self.quantity)
    }
}

/// A pair of LRD and USD amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub lrd: Money,
    pub usd: Money,
}

impl Totals {
    /// Sums the line totals of `items` in both currencies.
    ///
    /// Either sum above [`MAX_AMOUNT`] is rejected, so one document can never
    /// push a report or balance past `i64`.
    pub fn of(items: &[LineItem]) -> Result<Self, ValidationError> {
        Ok(Totals {
            lrd: checked_sum(items, |item| item.unit_price_lrd)?,
            usd: checked_sum(items, |item| item.unit_price_usd)?,
        })
    }

    /// Caller-supplied totals win; missing ones fall back to these.
    pub fn or_supplied(self, lrd: Option<Money>, usd: Option<Money>) -> Self {
        Totals {
            lrd: lrd.unwrap_or(self.lrd),
            usd: usd.unwrap_or(self.usd),
        }
    }
}

fn checked_sum(items: &[LineItem], unit_price: fn(&LineItem) -> Money) -> Result<Money, ValidationError> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| {
            unit_price(item)
                .checked_times(item.quantity)
                .and_then(|line| acc.checked_add(line))
                .filter(|total| *total <= MAX_AMOUNT)
        })
        .ok_or_else(|| ValidationError::out_of_range("total", MAX_AMOUNT))
}

// =============================================================================
// Transaction
// =============================================================================

/// An immutable monetary event: sale, restock or return.
///
/// Inserted once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub store: String,
    pub currency: Currency,
    pub items: Vec<LineItem>,
    pub amount_received_lrd: Money,
    pub amount_received_usd: Money,
    /// Overpayment, expressed in `change_currency`.
    pub change: Money,
    pub change_currency: Currency,
    pub total_lrd: Money,
    pub total_usd: Money,
    /// Effective rate applied to a `BOTH` payment.
    #[ts(as = "Option<f64>")]
    pub exchange_rate: Option<ExchangeRate>,
    /// Returns only.
    pub reason: Option<String>,
    /// Returns only. Optional and unvalidated.
    pub original_transaction_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// =============================================================================
// Credit
// =============================================================================

/// A deferred sale (a customer tab).
///
/// ## Lifecycle
/// ```text
/// create_credit ──► Pending ──pay_credit──► Paid
///   (stock taken)                (sale Transaction created and linked)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Credit {
    pub id: String,
    pub store: String,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub total_lrd: Money,
    pub total_usd: Money,
    pub status: CreditStatus,
    /// `LRD` or `USD`, never `BOTH`.
    pub preferred_currency: Currency,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_transaction_id: Option<String>,
}

impl Credit {
    pub fn totals(&self) -> Totals {
        Totals {
            lrd: self.total_lrd,
            usd: self.total_usd,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == CreditStatus::Pending
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, qty: i64, lrd: i64, usd: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            store: "Paynesville".to_string(),
            name: format!("Product {id}"),
            quantity: qty,
            price_usd: usd.map(Money::from_cents),
            price_lrd: Money::from_cents(lrd),
            total_lrd: Some(Money::from_cents(lrd * qty)),
            category: None,
            barcode: None,
            shelf_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snapshot_freezes_prices() {
        let mut rice = product("rice", 10, 197_000, Some(1_000));
        let line = LineItem::snapshot(&rice, 2);
        rice.price_lrd = Money::from_cents(1);

        assert_eq!(line.product_name, "Product rice");
        assert_eq!(line.line_total_lrd().cents(), 394_000);
        assert_eq!(line.line_total_usd().cents(), 2_000);
    }

    #[test]
    fn test_unpriced_usd_snapshots_as_zero() {
        let line = LineItem::snapshot(&product("oil", 1, 45_000, None), 3);
        assert_eq!(line.unit_price_usd, Money::zero());
    }

    #[test]
    fn test_totals() {
        let items = vec![
            LineItem::snapshot(&product("a", 10, 1_000, Some(5)), 2),
            LineItem::snapshot(&product("b", 10, 300, Some(2)), 1),
        ];
        let totals = Totals::of(&items).unwrap();
        assert_eq!(totals.lrd.cents(), 2_300);
        assert_eq!(totals.usd.cents(), 12);

        let supplied = totals.or_supplied(Some(Money::from_cents(2_000)), None);
        assert_eq!(supplied.lrd.cents(), 2_000);
        assert_eq!(supplied.usd.cents(), 12);
    }

    #[test]
    fn test_totals_past_ceiling_rejected() {
        let pricey = product("gold", 10, MAX_AMOUNT.cents(), None);
        let one = vec![LineItem::snapshot(&pricey, 1)];
        assert_eq!(Totals::of(&one).unwrap().lrd, MAX_AMOUNT);

        let two = vec![LineItem::snapshot(&pricey, 1), LineItem::snapshot(&pricey, 1)];
        assert!(matches!(
            Totals::of(&two),
            Err(ValidationError::OutOfRange { .. })
        ));

        let wrapping = vec![LineItem::snapshot(&product("x", 1, 1_000, None), i64::MAX / 100)];
        assert!(Totals::of(&wrapping).is_err());
    }

    #[test]
    fn test_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Return).unwrap(),
            "\"return\""
        );
        assert_eq!(CreditStatus::Paid.as_str(), "paid");
    }
}
