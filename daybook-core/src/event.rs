//! Event templates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrencePattern;

/// A persisted calendar event.
///
/// `date` is the series anchor when `recurrence` is set. When an end time
/// is present it must lie strictly after the start on the same occurrence
/// date; that is the caller's contract, not validated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub text: String,
    pub date: NaiveDate,
    /// Start hour, 0–23. Ignored for all-day events.
    pub hour: u32,
    /// Start minutes, 0–59.
    #[serde(default)]
    pub minutes: u32,
    /// End hour; absent means the event ends one hour after it starts.
    #[serde(default)]
    pub end_hour: Option<u32>,
    #[serde(default)]
    pub end_minutes: u32,
    #[serde(default)]
    pub location: Option<String>,
    /// All-day events have no meaningful time fields.
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,
    /// Always `None` in stored data; projected instances carry the owning
    /// template's id here.
    #[serde(default)]
    pub parent_event_id: Option<String>,
    /// Task this event was created from, if any. Provenance only.
    #[serde(default)]
    pub source_task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn from_new(new: NewEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: new.text,
            date: new.date,
            hour: new.hour,
            minutes: new.minutes,
            end_hour: new.end_hour,
            end_minutes: new.end_minutes.unwrap_or(0),
            location: new.location,
            all_day: new.all_day,
            recurrence: new.recurrence,
            parent_event_id: None,
            source_task_id: new.source_task_id,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Timestamp used for sync conflict resolution.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn start_minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minutes
    }

    /// Minutes since midnight at which the event ends. Defaults to one hour
    /// after the start when no end hour is set.
    pub fn end_minute_of_day(&self) -> u32 {
        let end_hour = self.end_hour.unwrap_or(self.hour + 1);
        end_hour * 60 + self.end_minutes
    }
}

/// Input for `Store::add_event`.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub text: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub minutes: u32,
    pub end_hour: Option<u32>,
    pub end_minutes: Option<u32>,
    pub location: Option<String>,
    pub all_day: bool,
    pub source_task_id: Option<String>,
    pub recurrence: Option<RecurrencePattern>,
}

/// Field mask for `Store::update_event`; same merge rule as
/// [`crate::task::TaskPatch`].
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
    pub hour: Option<u32>,
    pub minutes: Option<u32>,
    pub end_hour: Option<Option<u32>>,
    pub end_minutes: Option<u32>,
    pub location: Option<Option<String>>,
    pub all_day: Option<bool>,
    pub recurrence: Option<Option<RecurrencePattern>>,
}
