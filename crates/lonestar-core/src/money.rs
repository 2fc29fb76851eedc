//! # Money Module
//!
//! Provides the `Money` type for handling monetary values in either currency.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TWO CURRENCIES, ONE REPRESENTATION                                     │
//! │                                                                         │
//! │  A shop in Monrovia prices rice at 1,970.00 LRD and 10.00 USD and      │
//! │  takes both at the counter. Floats drift on every conversion:          │
//! │    10.00 USD × 197.35 = 1973.4999999... LRD                            │
//! │                                                                         │
//! │  OUR SOLUTION: minor units (cents) in an i64                           │
//! │    1000 US cents × 197.35 = 197350 LRD cents, exactly                  │
//! │                                                                         │
//! │  Money does not know its currency. The field name does:                │
//! │    total_lrd: Money, total_usd: Money                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lonestar_core::money::Money;
//!
//! let unit = Money::from_cents(29_550); // 295.50 LRD
//! let line = unit.times(3);
//! assert_eq!(line.cents(), 88_650);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (cents) of LRD or USD.
///
/// ## Design Decisions
/// - **i64 (signed)**: change and surpluses are computed by subtraction
/// - **No currency tag**: every field carrying money names its currency
///
/// ## Where Money is Used
/// ```text
/// Product.price_lrd ──► LineItem.unit_price_lrd ──► Totals.lrd ──► Transaction.total_lrd
/// Product.price_usd ──► LineItem.unit_price_usd ──► Totals.usd ──► Transaction.total_usd
///                                                                      │
/// amount_received_* ──► payment::settle ──► change ◄────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Minor-unit portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Palm Oil 1L @ 450.00 LRD
    /// Quantity: 4
    ///      │
    ///      ▼
    /// times(4) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: 1800.00 LRD
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// [`times`](Self::times), or `None` on overflow.
    #[inline]
    pub const fn checked_times(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Clamps negative values to zero.
    ///
    /// Report totals never go below zero even when returns outweigh sales.
    #[inline]
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `major.minor` with no currency symbol, since Money is
/// currency-agnostic. Intended for logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
