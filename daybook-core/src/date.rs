//! Calendar-day arithmetic.
//!
//! Dates are compared by their local calendar day, never by elapsed hours.
//! The canonical string form is `YYYY-MM-DD`; it is the key used wherever a
//! date is compared as a string (journal keys, completion sets, the wire).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::event::Event;

/// Render a date as its canonical `YYYY-MM-DD` key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a canonical `YYYY-MM-DD` key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// The current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole calendar days between `today` and a due date. Negative when the
/// due date has passed, `None` when there is no due date.
pub fn days_until_on(due: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    due.map(|d| (d - today).num_days())
}

/// `days_until_on` against the current local day.
pub fn days_until(due: Option<NaiveDate>) -> Option<i64> {
    days_until_on(due, today())
}

/// True iff the due date falls strictly before `today`.
pub fn is_overdue_on(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    due.is_some_and(|d| d < today)
}

/// `is_overdue_on` against the current local day.
pub fn is_overdue(due: Option<NaiveDate>) -> bool {
    is_overdue_on(due, today())
}

/// True iff a completion timestamp falls on the given local calendar day.
pub fn was_completed_on(completed_at: Option<&DateTime<Utc>>, date: NaiveDate) -> bool {
    completed_at.is_some_and(|at| at.with_timezone(&Local).date_naive() == date)
}

/// True iff a completion timestamp falls on the current local day.
pub fn was_completed_today(completed_at: Option<&DateTime<Utc>>) -> bool {
    was_completed_on(completed_at, today())
}

/// Whether an event lies entirely in the past at local wall-clock `now`.
///
/// Past dates have ended; future dates have not; on the event's own day the
/// event has ended once `now` reaches its end time (start + 1h when no
/// explicit end is set).
pub fn is_event_ended_at(event: &Event, now: NaiveDateTime) -> bool {
    let today = now.date();
    if event.date < today {
        return true;
    }
    if event.date > today {
        return false;
    }

    let now_minute = now.time().hour() * 60 + now.time().minute();
    now_minute >= event.end_minute_of_day()
}

/// `is_event_ended_at` against the current local wall clock.
pub fn is_event_ended(event: &Event) -> bool {
    is_event_ended_at(event, Local::now().naive_local())
}
