//! Recurrence rules and occurrence matching.
//!
//! A [`RecurrencePattern`] plus an anchor date defines an infinite (or
//! bounded) series of occurrence dates. Nothing here is materialized:
//! [`matches`] answers a point query and [`occurrences_until`] walks a
//! finite range, so callers never hold more than the dates they asked for.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Unit the repeat interval counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// How a template repeats, relative to its anchor date.
///
/// `end_date` and `end_after` are both honored when both are set: whichever
/// bound is hit first ends the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// Repeat every N units. Zero disables the pattern entirely.
    pub interval: u32,
    /// Inclusive last date an occurrence may fall on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Maximum number of occurrences, counted from the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after: Option<u32>,
    /// Weekday numbers 0 (Sunday) through 6 (Saturday). Weekly only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
}

impl RecurrencePattern {
    pub fn daily(interval: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            interval,
            end_date: None,
            end_after: None,
            days_of_week: None,
        }
    }

    pub fn weekly(interval: u32, days_of_week: Vec<u8>) -> Self {
        Self {
            frequency: Frequency::Weekly,
            interval,
            end_date: None,
            end_after: None,
            days_of_week: Some(days_of_week),
        }
    }

    pub fn monthly(interval: u32) -> Self {
        Self {
            frequency: Frequency::Monthly,
            interval,
            end_date: None,
            end_after: None,
            days_of_week: None,
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn times(mut self, end_after: u32) -> Self {
        self.end_after = Some(end_after);
        self
    }
}

/// Whether `candidate` is an occurrence of the series anchored at `anchor`.
///
/// The `end_after` occurrence-count cap needs ordering context and is only
/// enforced by [`occurrences_until`].
pub fn matches(candidate: NaiveDate, anchor: NaiveDate, pattern: &RecurrencePattern) -> bool {
    if candidate < anchor {
        return false;
    }
    if let Some(end) = pattern.end_date {
        if candidate > end {
            return false;
        }
    }
    // A non-positive interval would loop or divide by zero; treat it as
    // "no recurrence": nothing past the anchor ever matches.
    if pattern.interval == 0 {
        return candidate == anchor;
    }
    let interval = i64::from(pattern.interval);

    match pattern.frequency {
        Frequency::Daily => {
            let days = (candidate - anchor).num_days();
            days % interval == 0
        }
        Frequency::Weekly => {
            let Some(days_of_week) = &pattern.days_of_week else {
                return false;
            };
            let weekday = candidate.weekday().num_days_from_sunday() as u8;
            if !days_of_week.contains(&weekday) {
                return false;
            }
            // Elapsed full weeks, not calendar-week aligned.
            let weeks = (candidate - anchor).num_days() / 7;
            weeks % interval == 0
        }
        Frequency::Monthly => {
            // Same day-of-month only; months without that day simply have
            // no occurrence (an anchor on the 31st skips February).
            if candidate.day() != anchor.day() {
                return false;
            }
            let months = (i64::from(candidate.year()) - i64::from(anchor.year())) * 12
                + (i64::from(candidate.month()) - i64::from(anchor.month()));
            months % interval == 0
        }
    }
}

/// All occurrence dates from `anchor` through `range_end` inclusive, in
/// order, stopping early once `end_after` occurrences have been produced.
pub fn occurrences_until(
    anchor: NaiveDate,
    pattern: &RecurrencePattern,
    range_end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = anchor;

    while current <= range_end {
        if let Some(end) = pattern.end_date {
            if current > end {
                break;
            }
        }
        if let Some(cap) = pattern.end_after {
            if dates.len() as u32 >= cap {
                break;
            }
        }
        if matches(current, anchor, pattern) {
            dates.push(current);
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    dates
}
