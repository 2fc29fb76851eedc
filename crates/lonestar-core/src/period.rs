//! # Period Module
//!
//! Whole-day date ranges for transaction queries and reports.
//!
//! A date picked at the counter means the whole local day:
//! ```text
//! 2025-03-14  →  [2025-03-14 00:00:00.000, 2025-03-14 23:59:59.999]  (local)
//! ```
//! Bounds are computed in any `chrono::TimeZone`; the engine passes `Local`,
//! tests pass `Utc` so they do not depend on the host's zone.

use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, SubsecRound,
    TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

/// Inclusive range of calendar days. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// No bounds: every transaction ever recorded.
    pub const fn all() -> Self {
        DateRange {
            from: None,
            to: None,
        }
    }

    pub const fn day(date: NaiveDate) -> Self {
        DateRange {
            from: Some(date),
            to: Some(date),
        }
    }

    pub const fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    /// Rejects inverted ranges and days outside [`MIN_YEAR`]..=[`MAX_YEAR`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, day) in [("from", self.from), ("to", self.to)] {
            if let Some(day) = day {
                check_year(field, day)?;
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ValidationError::InvertedRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Instant bounds in UTC: start of `from`, end of `to`, in `tz`.
    ///
    /// Validates first, so a range that cannot be resolved is an error and
    /// never an overflow.
    pub fn bounds<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ValidationError> {
        self.validate()?;
        let from = self.from.map(|d| start_of_day(d, tz)).transpose()?;
        let to = self.to.map(|d| end_of_day(d, tz)).transpose()?;
        Ok((from, to))
    }
}

/// Earliest calendar year a query may name.
pub const MIN_YEAR: i32 = 1900;
/// Latest calendar year a query may name.
pub const MAX_YEAR: i32 = 9999;

fn check_year(field: &str, day: NaiveDate) -> Result<(), ValidationError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&day.year()) {
        return Err(outside_window(field));
    }
    Ok(())
}

fn outside_window(field: &str) -> ValidationError {
    ValidationError::out_of_range(field, format!("{MIN_YEAR}-01-01..={MAX_YEAR}-12-31"))
}

/// The current instant at the millisecond precision records are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// First instant of `date` in `tz`.
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, ValidationError> {
    resolve(date.and_time(NaiveTime::MIN), tz).ok_or_else(|| outside_window("from"))
}

/// Last millisecond of `date` in `tz`.
fn end_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<DateTime<Utc>, ValidationError> {
    date.succ_opt()
        .and_then(|next| resolve(next.and_time(NaiveTime::MIN), tz))
        .and_then(|midnight| midnight.checked_sub_signed(TimeDelta::milliseconds(1)))
        .ok_or_else(|| outside_window("to"))
}

/// The calendar day `instant` falls on in `tz`.
pub fn local_day<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Maps a local wall-clock time to UTC. Ambiguous times (DST fall-back) take
/// the earlier instant; times skipped by a DST jump use the zone's offset at
/// that moment. `None` only at the edges of chrono's representable range.
fn resolve<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&naive).fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
            Some(DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
