//! # Validation Module
//!
//! Input validation for every request the engine accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Unknown currency codes, malformed numbers                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, positive quantities, non-negative amounts        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine, inside the unit of work                              │
//! │  ├── Stock on hand (conditional decrement)                             │
//! │  └── Payment sufficiency (payment::settle)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── UNIQUE(store, name), CHECK(quantity >= 0)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lonestar_core::validation::{validate_quantity, validate_store};
//!
//! assert_eq!(validate_store("  Paynesville ").unwrap(), "Paynesville");
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::currency::Currency;
use crate::error::ValidationError;
use crate::money::Money;
use crate::order::LineRequest;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;

/// Most units a single line may carry, and most units a product may hold.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest price, total or received amount: 10 billion in major units.
///
/// A line at [`MAX_QUANTITY`] and this price still fits in an `i64`.
pub const MAX_AMOUNT: Money = Money::from_cents(1_000_000_000_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates the store partition key.
///
/// ## Returns
/// The trimmed store name. Case is preserved: "Sinkor" and "sinkor" are
/// different stores.
pub fn validate_store(store: &str) -> ValidationResult<String> {
    required_text("store", store)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = required_text("customerName", name)?;
    check_len("customerName", &name)?;
    Ok(name)
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = required_text("name", name)?;
    check_len("name", &name)?;
    Ok(name)
}

fn required_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

fn check_len(field: &str, value: &str) -> ValidationResult<()> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Counter: "2 bags of rice, 0 tins of milk"                              │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │               (nothing is decremented)                         │
/// │       └── qty > MAX_QUANTITY? → Error: "quantity is out of range"      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::out_of_range("quantity", MAX_QUANTITY));
    }
    Ok(())
}

/// Opening stock for a new product: zero up to [`MAX_QUANTITY`].
pub fn validate_stock(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::out_of_range("quantity", MAX_QUANTITY));
    }
    Ok(())
}

/// Validates every requested line up front, before any stock moves.
///
/// Sales and credits accept an empty list; returns and restocks pass
/// `require_lines = true`.
pub fn validate_lines(items: &[LineRequest], require_lines: bool) -> ValidationResult<()> {
    if require_lines && items.is_empty() {
        return Err(ValidationError::required("items"));
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::required("productId"));
        }
        validate_quantity(item.quantity)?;
    }
    Ok(())
}

// =============================================================================
// Money Validators
// =============================================================================

/// Rejects negative prices and anything above [`MAX_AMOUNT`]. Zero is
/// allowed.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if price > MAX_AMOUNT {
        return Err(ValidationError::out_of_range(field, MAX_AMOUNT));
    }
    Ok(())
}

/// Same bounds as a price. Absent amounts pass here; whether they are
/// required depends on the payment currency.
pub fn validate_amount(field: &str, amount: Option<Money>) -> ValidationResult<()> {
    match amount {
        Some(value) => validate_price(field, value),
        None => Ok(()),
    }
}

/// Credits are tracked in a single currency.
pub fn validate_preferred_currency(currency: Currency) -> ValidationResult<Currency> {
    match currency {
        Currency::Lrd | Currency::Usd => Ok(currency),
        Currency::Both => Err(ValidationError::NotAllowed {
            field: "preferredCurrency".to_string(),
            allowed: vec!["LRD".to_string(), "USD".to_string()],
        }),
    }
}

/// Largest page a listing query returns when the caller asks for a limit.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Keeps a caller-supplied listing limit within `1..=MAX_PAGE_SIZE`.
/// No limit stays no limit.
pub fn clamp_limit(limit: Option<u32>) -> Option<u32> {
    limit.map(|limit| limit.clamp(1, MAX_PAGE_SIZE))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store() {
        assert_eq!(validate_store(" Sinkor ").unwrap(), "Sinkor");
        assert!(matches!(
            validate_store("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_names() {
        assert!(validate_product_name("Rice 25kg").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
        assert_eq!(validate_customer_name(" Musu K. ").unwrap(), "Musu K.");
    }

    #[test]
    fn test_lines() {
        assert!(validate_lines(&[], false).is_ok());
        assert!(validate_lines(&[], true).is_err());
        assert!(validate_lines(&[LineRequest::new("p1", 2)], true).is_ok());
        assert!(validate_lines(&[LineRequest::new("p1", 2), LineRequest::new("p2", 0)], false).is_err());
        assert!(validate_lines(&[LineRequest::new("p1", -1)], false).is_err());
        assert!(validate_lines(&[LineRequest::new(" ", 1)], false).is_err());
    }

    #[test]
    fn test_quantity_ceiling() {
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(MAX_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        let huge = [LineRequest::new("p1", i64::MAX / 1000)];
        assert!(matches!(
            validate_lines(&huge, true),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_amount("amountReceivedLrd", None).is_ok());
        assert!(validate_amount("amountReceivedLrd", Some(Money::zero())).is_ok());
        assert!(validate_amount("amountReceivedLrd", Some(Money::from_cents(-1))).is_err());
        assert!(validate_price("priceLrd", Money::from_cents(-5)).is_err());
    }

    #[test]
    fn test_amount_ceiling() {
        assert!(validate_price("priceUsd", MAX_AMOUNT).is_ok());
        let over = Money::from_cents(MAX_AMOUNT.cents() + 1);
        assert!(matches!(
            validate_price("priceUsd", over),
            Err(ValidationError::OutOfRange { .. })
        ));
        let err = validate_amount("amountReceivedUsd", Some(Money::from_cents(i64::MAX / 100)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "amountReceivedUsd is out of range (limit 10000000000.00)"
        );
    }

    #[test]
    fn test_preferred_currency() {
        assert_eq!(validate_preferred_currency(Currency::Usd).unwrap(), Currency::Usd);
        assert!(validate_preferred_currency(Currency::Both).is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), None);
        assert_eq!(clamp_limit(Some(0)), Some(1));
        assert_eq!(clamp_limit(Some(20)), Some(20));
        assert_eq!(clamp_limit(Some(u32::MAX)), Some(MAX_PAGE_SIZE));
    }
}
