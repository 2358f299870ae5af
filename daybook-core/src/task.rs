//! Task templates.
//!
//! A stored task is always a template: it may carry a recurrence pattern,
//! in which case its `due_date` is the series anchor and per-occurrence
//! completion lives in `completed_dates`. Projected per-date instances are
//! a separate type, [`crate::occurrence::TaskOnDate`], and are never
//! persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrencePattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A checklist line under a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A concrete hour a task has been placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub date: NaiveDate,
    pub hour: u32,
}

/// A persisted task template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    /// Completion of the task itself. Meaningful only without `recurrence`;
    /// recurring templates track completion per date in `completed_dates`.
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Due date, or the series anchor when `recurrence` is set.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub scheduled_slots: Vec<ScheduledSlot>,
    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,
    /// Occurrence dates marked done on a recurring template.
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    /// Always `None` in stored data; projected instances carry the owning
    /// template's id here.
    #[serde(default)]
    pub parent_task_id: Option<String>,
    /// Manual sort key, dense and zero-based. Written only by
    /// `Store::reorder_tasks` (and append on add).
    pub order: usize,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Timestamp used for sync conflict resolution.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Input for `Store::add_task`.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub recurrence: Option<RecurrencePattern>,
    pub subtasks: Vec<Subtask>,
}

impl NewTask {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Field mask for `Store::update_task`.
///
/// Present fields overwrite the template, absent fields are untouched;
/// double-`Option` fields distinguish "set to null" from "leave alone".
/// `order` is deliberately absent — `Store::reorder_tasks` is the only
/// writer of the sort key.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Option<Priority>>,
    pub recurrence: Option<Option<RecurrencePattern>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub scheduled_slots: Option<Vec<ScheduledSlot>>,
}

impl TaskPatch {
    pub fn completed(done: bool) -> Self {
        Self {
            completed: Some(done),
            ..Self::default()
        }
    }

    pub fn text_to(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}
