//! # Balance Module
//!
//! Credit (tab) balance view for one store.
//!
//! ```text
//! credits ──┬── pending ──┬── preferred LRD
//!           │             └── preferred USD
//!           ├── paid ─────┬── preferred LRD
//!           │             └── preferred USD
//!           ├── total (pending + paid)
//!           └── outstanding per customer (pending only)
//! ```

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::currency::Currency;
use crate::money::Money;
use crate::types::{Credit, CreditStatus};

/// Count and totals of a set of credits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    pub count: u64,
    pub total_lrd: Money,
    pub total_usd: Money,
}

impl CurrencyTotals {
    fn add(&mut self, credit: &Credit) {
        self.count += 1;
        self.total_lrd += credit.total_lrd;
        self.total_usd += credit.total_usd;
    }
}

/// One status partition, sub-totalled by preferred currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotals {
    pub count: u64,
    pub total_lrd: Money,
    pub total_usd: Money,
    /// Credits whose preferred currency is LRD.
    pub lrd: CurrencyTotals,
    /// Credits whose preferred currency is USD.
    pub usd: CurrencyTotals,
}

impl StatusTotals {
    fn add(&mut self, credit: &Credit) {
        self.count += 1;
        self.total_lrd += credit.total_lrd;
        self.total_usd += credit.total_usd;
        match credit.preferred_currency {
            Currency::Usd => self.usd.add(credit),
            _ => self.lrd.add(credit),
        }
    }

    fn merge(a: &StatusTotals, b: &StatusTotals) -> StatusTotals {
        let sum = |x: &CurrencyTotals, y: &CurrencyTotals| CurrencyTotals {
            count: x.count + y.count,
            total_lrd: x.total_lrd + y.total_lrd,
            total_usd: x.total_usd + y.total_usd,
        };
        StatusTotals {
            count: a.count + b.count,
            total_lrd: a.total_lrd + b.total_lrd,
            total_usd: a.total_usd + b.total_usd,
            lrd: sum(&a.lrd, &b.lrd),
            usd: sum(&a.usd, &b.usd),
        }
    }
}

/// What one customer still owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalance {
    pub customer_name: String,
    pub credits: u64,
    pub total_lrd: Money,
    pub total_usd: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub pending: StatusTotals,
    pub paid: StatusTotals,
    pub total: StatusTotals,
    /// Largest LRD balance first.
    pub outstanding_by_customer: Vec<CustomerBalance>,
}

impl CreditBalance {
    pub fn from_credits(credits: &[Credit]) -> Self {
        let mut pending = StatusTotals::default();
        let mut paid = StatusTotals::default();
        let mut owed: BTreeMap<&str, CustomerBalance> = BTreeMap::new();

        for credit in credits {
            match credit.status {
                CreditStatus::Pending => {
                    pending.add(credit);
                    let entry = owed
                        .entry(&credit.customer_name)
                        .or_insert_with(|| CustomerBalance {
                            customer_name: credit.customer_name.clone(),
                            credits: 0,
                            total_lrd: Money::zero(),
                            total_usd: Money::zero(),
                        });
                    entry.credits += 1;
                    entry.total_lrd += credit.total_lrd;
                    entry.total_usd += credit.total_usd;
                }
                CreditStatus::Paid => paid.add(credit),
            }
        }

        let mut outstanding_by_customer: Vec<CustomerBalance> = owed.into_values().collect();
        outstanding_by_customer.sort_by_key(|c| Reverse(c.total_lrd));

        CreditBalance {
            total: StatusTotals::merge(&pending, &paid),
            pending,
            paid,
            outstanding_by_customer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn credit(customer: &str, status: CreditStatus, currency: Currency, lrd: i64, usd: i64) -> Credit {
        Credit {
            id: format!("{customer}-{lrd}"),
            store: "Sinkor".to_string(),
            customer_name: customer.to_string(),
            items: vec![],
            total_lrd: Money::from_cents(lrd),
            total_usd: Money::from_cents(usd),
            status,
            preferred_currency: currency,
            created_at: Utc::now(),
            paid_at: None,
            payment_transaction_id: None,
        }
    }

    #[test]
    fn test_partitions_and_subtotals() {
        let credits = vec![
            credit("Musu", CreditStatus::Pending, Currency::Lrd, 10_000, 50),
            credit("Musu", CreditStatus::Pending, Currency::Usd, 20_000, 100),
            credit("Kollie", CreditStatus::Pending, Currency::Lrd, 5_000, 25),
            credit("Kollie", CreditStatus::Paid, Currency::Usd, 7_000, 35),
        ];
        let balance = CreditBalance::from_credits(&credits);

        assert_eq!(balance.pending.count, 3);
        assert_eq!(balance.pending.total_lrd.cents(), 35_000);
        assert_eq!(balance.pending.lrd.count, 2);
        assert_eq!(balance.pending.usd.total_usd.cents(), 100);
        assert_eq!(balance.paid.count, 1);
        assert_eq!(balance.paid.usd.total_lrd.cents(), 7_000);
        assert_eq!(balance.total.count, 4);
        assert_eq!(balance.total.total_lrd.cents(), 42_000);
        assert_eq!(balance.total.usd.count, 2);

        let owed: Vec<_> = balance
            .outstanding_by_customer
            .iter()
            .map(|c| (c.customer_name.as_str(), c.credits, c.total_lrd.cents()))
            .collect();
        assert_eq!(owed, vec![("Musu", 2, 30_000), ("Kollie", 1, 5_000)]);
    }

    #[test]
    fn test_empty() {
        let balance = CreditBalance::from_credits(&[]);
        assert_eq!(balance.total.count, 0);
        assert!(balance.outstanding_by_customer.is_empty());
    }
}
