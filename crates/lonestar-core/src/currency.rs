//! # Currency Module
//!
//! Currency codes and the shared LRD-per-USD exchange rate.
//!
//! ## Conversion Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rate = LRD per 1 USD, four fractional digits                          │
//! │                                                                         │
//! │    197.25  →  ExchangeRate(1_972_500)                                  │
//! │                                                                         │
//! │  to_lrd(usd) = round(usd × rate)                                       │
//! │  to_usd(lrd) = round(lrd ÷ rate)                                       │
//! │                                                                         │
//! │  Rounding is half away from zero, to the cent. The SQL rate cascade    │
//! │  in lonestar-db uses the same integer formula so catalog prices and    │
//! │  checkout conversions always agree.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Currency
// =============================================================================

/// Currency a transaction is settled in.
///
/// `Both` means the customer paid partly in LRD and partly in USD. Credits
/// only accept `Lrd` or `Usd` as their preferred currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Lrd,
    Usd,
    Both,
}

impl Currency {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Currency::Lrd => "LRD",
            Currency::Usd => "USD",
            Currency::Both => "BOTH",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Fixed-point scale of [`ExchangeRate`]: four fractional digits.
pub const RATE_SCALE: i64 = 10_000;

/// Highest accepted rate, in LRD per USD.
///
/// At this rate the largest valid USD amount still converts to an LRD amount
/// that fits in an `i64`.
pub const MAX_RATE: i64 = 1_000_000;

/// LRD per 1 USD, held as a fixed-point integer.
///
/// Crosses the wire as a plain JSON number (`197.25`) and is validated on the
/// way in: zero, negative, NaN and infinite rates never construct.
///
/// ```rust
/// use lonestar_core::{ExchangeRate, Money};
///
/// let rate = ExchangeRate::from_decimal(197.25).unwrap();
/// assert_eq!(rate.scaled(), 1_972_500);
/// assert_eq!(rate.to_lrd(Money::from_cents(100)).cents(), 19_725);
/// assert!(ExchangeRate::from_decimal(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// Builds a rate from its decimal form, rounded to four places.
    pub fn from_decimal(rate: f64) -> Result<Self, ValidationError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ValidationError::MustBePositive {
                field: "rate".to_string(),
            });
        }
        if rate > MAX_RATE as f64 {
            return Err(ValidationError::out_of_range("rate", MAX_RATE));
        }
        let scaled = (rate * RATE_SCALE as f64).round();
        if scaled < 1.0 {
            return Err(ValidationError::MustBePositive {
                field: "rate".to_string(),
            });
        }
        Ok(ExchangeRate(scaled as i64))
    }

    /// Rebuilds a rate from its stored fixed-point form.
    pub fn from_scaled(scaled: i64) -> Result<Self, ValidationError> {
        if scaled <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "rate".to_string(),
            });
        }
        if scaled > MAX_RATE * RATE_SCALE {
            return Err(ValidationError::out_of_range("rate", MAX_RATE));
        }
        Ok(ExchangeRate(scaled))
    }

    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    /// Decimal form, for display and JSON only.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }

    /// USD → LRD.
    ///
    /// ## User Workflow
    /// ```text
    /// Customer pays 500.00 LRD + 3.00 USD on a 1000.00 LRD bill @ 197
    ///      │
    ///      ▼
    /// to_lrd(3.00 USD) ← THIS FUNCTION  =  591.00 LRD
    ///      │
    ///      ▼
    /// 500.00 + 591.00 = 1091.00 ≥ 1000.00  → accepted, 91.00 LRD change
    /// ```
    pub fn to_lrd(&self, usd: Money) -> Money {
        Money::from_cents(div_round(
            usd.cents() as i128 * self.0 as i128,
            RATE_SCALE as i128,
        ))
    }

    /// LRD → USD.
    pub fn to_usd(&self, lrd: Money) -> Money {
        Money::from_cents(div_round(
            lrd.cents() as i128 * RATE_SCALE as i128,
            self.0 as i128,
        ))
    }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ExchangeRate::from_decimal(value)
    }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.as_decimal()
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / RATE_SCALE, self.0 % RATE_SCALE)
    }
}

/// Integer division rounding half away from zero. `d` is always positive.
///
/// Saturates at the `i64` bounds; validated amounts and rates never get
/// there.
fn div_round(n: i128, d: i128) -> i64 {
    let q = n / d;
    let r = n % d;
    let adjusted = if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    };
    i64::try_from(adjusted).unwrap_or(if adjusted < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Currency Rate Record
// =============================================================================

/// The singleton rate row shared by every store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    #[ts(as = "f64")]
    pub rate: ExchangeRate,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(r: f64) -> ExchangeRate {
        ExchangeRate::from_decimal(r).unwrap()
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(ExchangeRate::from_decimal(0.0).is_err());
        assert!(ExchangeRate::from_decimal(-1.5).is_err());
        assert!(ExchangeRate::from_decimal(f64::NAN).is_err());
        assert!(ExchangeRate::from_decimal(f64::INFINITY).is_err());
        assert!(ExchangeRate::from_decimal(0.00001).is_err());
        assert!(ExchangeRate::from_scaled(0).is_err());
    }

    #[test]
    fn test_rate_ceiling() {
        assert_eq!(rate(MAX_RATE as f64).scaled(), MAX_RATE * RATE_SCALE);
        assert!(matches!(
            ExchangeRate::from_decimal(MAX_RATE as f64 + 1.0),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(ExchangeRate::from_decimal(1e300).is_err());
        assert!(ExchangeRate::from_scaled(MAX_RATE * RATE_SCALE + 1).is_err());
    }

    #[test]
    fn test_conversion_saturates_instead_of_wrapping() {
        let top = rate(MAX_RATE as f64);
        assert_eq!(top.to_lrd(Money::from_cents(i64::MAX)).cents(), i64::MAX);
        assert_eq!(top.to_lrd(Money::from_cents(i64::MIN)).cents(), i64::MIN);
    }

    #[test]
    fn test_to_lrd() {
        let r = rate(197.0);
        assert_eq!(r.to_lrd(Money::from_cents(300)).cents(), 59_100);
        assert_eq!(r.to_lrd(Money::from_cents(200)).cents(), 39_400);

        // 0.01 USD × 197.35 = 1.9735 LRD → 1.97
        assert_eq!(rate(197.35).to_lrd(Money::from_cents(1)).cents(), 197);
        // 0.01 USD × 0.5 = 0.005 → half rounds away from zero
        assert_eq!(rate(0.5).to_lrd(Money::from_cents(1)).cents(), 1);
    }

    #[test]
    fn test_to_usd() {
        let r = rate(197.0);
        // 9100 LRD cents / 197 = 46.19 → 46 US cents
        assert_eq!(r.to_usd(Money::from_cents(9_100)).cents(), 46);
        assert_eq!(r.to_usd(Money::from_cents(197_000)).cents(), 1_000);
        assert_eq!(r.to_usd(Money::from_cents(-197_000)).cents(), -1_000);
    }

    #[test]
    fn test_display_and_json() {
        let r = rate(197.25);
        assert_eq!(r.to_string(), "197.2500");
        assert_eq!(serde_json::to_string(&r).unwrap(), "197.25");

        let parsed: ExchangeRate = serde_json::from_str("180.5").unwrap();
        assert_eq!(parsed.scaled(), 1_805_000);
        assert!(serde_json::from_str::<ExchangeRate>("-3").is_err());
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(serde_json::to_string(&Currency::Both).unwrap(), "\"BOTH\"");
        let lrd: Currency = serde_json::from_str("\"LRD\"").unwrap();
        assert_eq!(lrd, Currency::Lrd);
        assert_eq!(Currency::Usd.to_string(), "USD");
    }
}
