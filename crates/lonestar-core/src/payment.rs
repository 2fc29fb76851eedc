//! # Payment Module
//!
//! Decides whether money tendered covers the amount due, and how much
//! change goes back, in which currency.
//!
//! ## Sufficiency Rules
//! ```text
//! ┌──────────┬──────────────────────────────────┬──────────────────────────┐
//! │ currency │ must be present & covering       │ change currency          │
//! ├──────────┼──────────────────────────────────┼──────────────────────────┤
//! │ LRD      │ received_lrd ≥ due.lrd           │ LRD                      │
//! │ USD      │ received_usd ≥ due.usd           │ USD                      │
//! │ BOTH     │ received_lrd + to_lrd(received_  │ caller's choice,         │
//! │          │ usd) ≥ due.lrd                   │ LRD when not given       │
//! └──────────┴──────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! The amount that does not apply to a single-currency payment is stored as
//! zero.

use serde::{Deserialize, Serialize};

use crate::currency::{Currency, ExchangeRate};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Totals;
use crate::validation::{validate_amount, MAX_AMOUNT};

/// What the customer handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub currency: Currency,
    pub received_lrd: Option<Money>,
    pub received_usd: Option<Money>,
    pub change_currency: Option<Currency>,
}

/// The payment fields persisted on a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub amount_received_lrd: Money,
    pub amount_received_usd: Money,
    pub change: Money,
    pub change_currency: Currency,
    /// Set for `BOTH` payments only.
    pub exchange_rate: Option<ExchangeRate>,
}

impl Settlement {
    /// No money moved: returns and restocks.
    pub fn none(currency: Currency) -> Self {
        Settlement {
            amount_received_lrd: Money::zero(),
            amount_received_usd: Money::zero(),
            change: Money::zero(),
            change_currency: currency,
            exchange_rate: None,
        }
    }
}

/// Validates a tender against the amount due.
///
/// `rate` is only consulted for `BOTH`, where it is required; the caller
/// resolves it from the request or from configuration.
///
/// ## User Workflow
/// ```text
/// Bill: 1000.00 LRD
/// Customer: 500.00 LRD + 3.00 USD, rate 197
///      │
///      ▼
/// settle() ← THIS FUNCTION
///      │
///      ├── 500.00 + 591.00 = 1091.00 ≥ 1000.00
///      │
///      ▼
/// Settlement { change: 91.00, change_currency: LRD, exchange_rate: 197 }
/// ```
pub fn settle(tender: &Tender, due: Totals, rate: Option<ExchangeRate>) -> CoreResult<Settlement> {
    validate_amount("amountReceivedLrd", tender.received_lrd)?;
    validate_amount("amountReceivedUsd", tender.received_usd)?;

    match tender.currency {
        Currency::Lrd => {
            let received = tender
                .received_lrd
                .ok_or_else(|| ValidationError::required("amountReceivedLrd"))?;
            covers(Currency::Lrd, due.lrd, received)?;
            Ok(Settlement {
                amount_received_lrd: received,
                amount_received_usd: Money::zero(),
                change: received - due.lrd,
                change_currency: Currency::Lrd,
                exchange_rate: None,
            })
        }
        Currency::Usd => {
            let received = tender
                .received_usd
                .ok_or_else(|| ValidationError::required("amountReceivedUsd"))?;
            covers(Currency::Usd, due.usd, received)?;
            Ok(Settlement {
                amount_received_lrd: Money::zero(),
                amount_received_usd: received,
                change: received - due.usd,
                change_currency: Currency::Usd,
                exchange_rate: None,
            })
        }
        Currency::Both => {
            let lrd = tender
                .received_lrd
                .ok_or_else(|| ValidationError::required("amountReceivedLrd"))?;
            let usd = tender
                .received_usd
                .ok_or_else(|| ValidationError::required("amountReceivedUsd"))?;

            let rate = rate.ok_or_else(|| ValidationError::required("exchangeRate"))?;

            let tendered = lrd
                .checked_add(rate.to_lrd(usd))
                .ok_or_else(|| ValidationError::out_of_range("amountReceivedUsd", MAX_AMOUNT))?;
            covers(Currency::Both, due.lrd, tendered)?;

            let surplus = tendered - due.lrd;
            let (change, change_currency) = match tender.change_currency {
                Some(Currency::Usd) => (rate.to_usd(surplus), Currency::Usd),
                _ => (surplus, Currency::Lrd),
            };
            Ok(Settlement {
                amount_received_lrd: lrd,
                amount_received_usd: usd,
                change,
                change_currency,
                exchange_rate: Some(rate),
            })
        }
    }
}

fn covers(currency: Currency, due: Money, tendered: Money) -> CoreResult<()> {
    if tendered < due {
        return Err(CoreError::InsufficientPayment {
            currency,
            due,
            tendered,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> Option<ExchangeRate> {
        ExchangeRate::from_decimal(197.0).ok()
    }

    fn due_lrd(cents: i64) -> Totals {
        Totals {
            lrd: Money::from_cents(cents),
            usd: Money::zero(),
        }
    }

    fn tender(currency: Currency, lrd: Option<i64>, usd: Option<i64>) -> Tender {
        Tender {
            currency,
            received_lrd: lrd.map(Money::from_cents),
            received_usd: usd.map(Money::from_cents),
            change_currency: None,
        }
    }

    #[test]
    fn test_lrd_exact_and_short() {
        let short = settle(&tender(Currency::Lrd, Some(99_900), None), due_lrd(100_000), rate());
        assert!(matches!(short, Err(CoreError::InsufficientPayment { .. })));

        let exact = settle(&tender(Currency::Lrd, Some(100_000), Some(500)), due_lrd(100_000), rate())
            .unwrap();
        assert_eq!(exact.change, Money::zero());
        assert_eq!(exact.change_currency, Currency::Lrd);
        assert_eq!(exact.amount_received_usd, Money::zero());
        assert_eq!(exact.exchange_rate, None);
    }

    #[test]
    fn test_lrd_requires_amount() {
        let missing = settle(&tender(Currency::Lrd, None, Some(10_000)), due_lrd(100), rate());
        assert!(matches!(
            missing,
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_usd_change_normalized() {
        let mut t = tender(Currency::Usd, None, Some(1_500));
        t.change_currency = Some(Currency::Lrd);
        let due = Totals {
            lrd: Money::from_cents(197_000),
            usd: Money::from_cents(1_000),
        };
        let settled = settle(&t, due, rate()).unwrap();
        assert_eq!(settled.change.cents(), 500);
        assert_eq!(settled.change_currency, Currency::Usd);
        assert_eq!(settled.amount_received_lrd, Money::zero());
    }

    #[test]
    fn test_both_mixed_payment() {
        let ok = settle(&tender(Currency::Both, Some(50_000), Some(300)), due_lrd(100_000), rate())
            .unwrap();
        assert_eq!(ok.change.cents(), 9_100);
        assert_eq!(ok.change_currency, Currency::Lrd);
        assert_eq!(ok.exchange_rate, rate());

        let short = settle(&tender(Currency::Both, Some(50_000), Some(200)), due_lrd(100_000), rate());
        match short {
            Err(CoreError::InsufficientPayment { tendered, .. }) => {
                assert_eq!(tendered.cents(), 89_400)
            }
            other => panic!("expected insufficient payment, got {other:?}"),
        }
    }

    #[test]
    fn test_both_change_in_usd() {
        let mut t = tender(Currency::Both, Some(50_000), Some(300));
        t.change_currency = Some(Currency::Usd);
        let settled = settle(&t, due_lrd(100_000), rate()).unwrap();
        assert_eq!(settled.change_currency, Currency::Usd);
        assert_eq!(settled.change.cents(), 46);
    }

    #[test]
    fn test_both_requires_both_amounts() {
        assert!(settle(&tender(Currency::Both, Some(200_000), None), due_lrd(100_000), rate()).is_err());
    }

    #[test]
    fn test_both_requires_rate() {
        let result = settle(&tender(Currency::Both, Some(50_000), Some(300)), due_lrd(100_000), None);
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        // Single-currency payments never look at the rate
        assert!(settle(&tender(Currency::Lrd, Some(100), None), due_lrd(100), None).is_ok());
    }

    #[test]
    fn test_oversized_usd_tender_is_not_reported_as_short() {
        let huge = tender(Currency::Both, Some(0), Some(i64::MAX / 100));
        let result = settle(&huge, due_lrd(100_000), rate());
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // The largest accepted tender at the largest accepted rate still adds up
        let top_rate = ExchangeRate::from_decimal(crate::currency::MAX_RATE as f64).ok();
        let biggest = tender(Currency::Both, Some(MAX_AMOUNT.cents()), Some(MAX_AMOUNT.cents()));
        let settled = settle(&biggest, due_lrd(100_000), top_rate).unwrap();
        assert!(settled.change.is_positive());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = settle(&tender(Currency::Lrd, Some(-1), None), due_lrd(0), rate());
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
    }
}
