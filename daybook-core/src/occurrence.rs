//! Occurrence projection.
//!
//! Recurring templates are expanded on demand into per-date instances;
//! nothing here is ever persisted. The projected types are deliberately
//! distinct from [`Task`]/[`Event`] so an instance cannot be written back
//! to the store as if it were a template.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::event::Event;
use crate::recurrence;
use crate::task::Task;

/// A task as it appears on one concrete date.
#[derive(Debug, Clone)]
pub enum TaskOnDate {
    /// The stored template itself: a non-recurring task due that day, or a
    /// recurring template on its anchor date.
    Template(Task),
    /// A computed instance of a recurring template.
    Occurrence(TaskOccurrence),
}

#[derive(Debug, Clone)]
pub struct TaskOccurrence {
    /// Id of the owning template.
    pub parent_id: String,
    /// Concrete date this instance falls on.
    pub date: NaiveDate,
    /// Whether this date is in the template's completed set.
    pub completed: bool,
    /// The owning template, unmodified.
    pub template: Task,
}

impl TaskOnDate {
    pub fn template(&self) -> &Task {
        match self {
            Self::Template(task) => task,
            Self::Occurrence(occ) => &occ.template,
        }
    }

    /// Id of the owning template.
    pub fn template_id(&self) -> &str {
        &self.template().id
    }

    /// The concrete date this entry falls on.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Template(task) => task.due_date,
            Self::Occurrence(occ) => Some(occ.date),
        }
    }

    /// Completion as seen on this date.
    pub fn completed(&self) -> bool {
        match self {
            Self::Template(task) if task.is_recurring() => task
                .due_date
                .is_some_and(|anchor| task.completed_dates.contains(&anchor)),
            Self::Template(task) => task.completed,
            Self::Occurrence(occ) => occ.completed,
        }
    }

    /// The date to hand to `Store::update_task` when toggling completion
    /// of this entry. `None` means the toggle targets the template's own
    /// `completed` flag.
    pub fn instance_date(&self) -> Option<NaiveDate> {
        if self.template().is_recurring() {
            self.date()
        } else {
            None
        }
    }
}

/// An event as it appears on one concrete date.
#[derive(Debug, Clone)]
pub enum EventOnDate {
    Template(Event),
    Occurrence(EventOccurrence),
}

#[derive(Debug, Clone)]
pub struct EventOccurrence {
    pub parent_id: String,
    pub date: NaiveDate,
    pub template: Event,
}

impl EventOnDate {
    pub fn template(&self) -> &Event {
        match self {
            Self::Template(event) => event,
            Self::Occurrence(occ) => &occ.template,
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template().id
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Template(event) => event.date,
            Self::Occurrence(occ) => occ.date,
        }
    }
}

/// All tasks visible on `date`: direct due-date matches plus recurrence
/// matches. A template contributes at most one entry per date.
pub fn tasks_on_date(tasks: &[Task], date: NaiveDate) -> Vec<TaskOnDate> {
    tasks
        .iter()
        .filter_map(|task| project_task(task, date))
        .collect()
}

fn project_task(task: &Task, date: NaiveDate) -> Option<TaskOnDate> {
    // Stored data never contains projected instances; skip one if it
    // somehow got in.
    if task.parent_task_id.is_some() {
        return None;
    }

    if task.due_date == Some(date) {
        return Some(TaskOnDate::Template(task.clone()));
    }

    let anchor = task.due_date?;
    let pattern = task.recurrence.as_ref()?;
    if recurrence::matches(date, anchor, pattern) {
        Some(TaskOnDate::Occurrence(TaskOccurrence {
            parent_id: task.id.clone(),
            date,
            completed: task.completed_dates.contains(&date),
            template: task.clone(),
        }))
    } else {
        None
    }
}

/// All events visible on `date`.
pub fn events_on_date(events: &[Event], date: NaiveDate) -> Vec<EventOnDate> {
    events
        .iter()
        .filter_map(|event| project_event(event, date))
        .collect()
}

fn project_event(event: &Event, date: NaiveDate) -> Option<EventOnDate> {
    if event.parent_event_id.is_some() {
        return None;
    }

    if event.date == date {
        return Some(EventOnDate::Template(event.clone()));
    }

    let pattern = event.recurrence.as_ref()?;
    if recurrence::matches(date, event.date, pattern) {
        Some(EventOnDate::Occurrence(EventOccurrence {
            parent_id: event.id.clone(),
            date,
            template: event.clone(),
        }))
    } else {
        None
    }
}

/// Tasks visible anywhere in `from..=to`, walking the days in order.
///
/// Each template is listed once per projection kind: its anchor-date entry
/// and its earliest recurrence match within the range, never a row per
/// matching day.
pub fn tasks_in_range(tasks: &[Task], from: NaiveDate, to: NaiveDate) -> Vec<TaskOnDate> {
    let mut seen: HashSet<(String, bool)> = HashSet::new();
    let mut result = Vec::new();

    let mut date = from;
    while date <= to {
        for entry in tasks_on_date(tasks, date) {
            let key = (
                entry.template_id().to_string(),
                matches!(entry, TaskOnDate::Occurrence(_)),
            );
            if seen.insert(key) {
                result.push(entry);
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    result
}

/// Events visible anywhere in `from..=to`, de-duplicated like
/// [`tasks_in_range`].
pub fn events_in_range(events: &[Event], from: NaiveDate, to: NaiveDate) -> Vec<EventOnDate> {
    let mut seen: HashSet<(String, bool)> = HashSet::new();
    let mut result = Vec::new();

    let mut date = from;
    while date <= to {
        for entry in events_on_date(events, date) {
            let key = (
                entry.template_id().to_string(),
                matches!(entry, EventOnDate::Occurrence(_)),
            );
            if seen.insert(key) {
                result.push(entry);
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NewEvent;
    use crate::recurrence::RecurrencePattern;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(text: &str, due: Option<NaiveDate>, recurrence: Option<RecurrencePattern>) -> Task {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
            completed_at: None,
            due_date: due,
            priority: None,
            scheduled_slots: Vec::new(),
            recurrence,
            completed_dates: Default::default(),
            parent_task_id: None,
            order: 0,
            subtasks: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn direct_due_date_match_yields_the_template() {
        let t = task("pay rent", Some(date(2024, 3, 1)), None);
        let visible = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 1));
        assert_eq!(visible.len(), 1);
        assert!(matches!(visible[0], TaskOnDate::Template(_)));
        assert_eq!(visible[0].template_id(), t.id);

        assert!(tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 2)).is_empty());
    }

    #[test]
    fn recurring_match_yields_an_occurrence_with_parent_and_date() {
        // Fridays, anchored on a Friday
        let t = task(
            "weekly review",
            Some(date(2024, 3, 1)),
            Some(RecurrencePattern::weekly(1, vec![5])),
        );
        let visible = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 8));
        assert_eq!(visible.len(), 1);
        let TaskOnDate::Occurrence(occ) = &visible[0] else {
            panic!("expected an occurrence");
        };
        assert_eq!(occ.parent_id, t.id);
        assert_eq!(occ.date, date(2024, 3, 8));
        assert!(!occ.completed);
    }

    #[test]
    fn anchor_date_yields_the_template_not_an_occurrence() {
        let t = task(
            "weekly review",
            Some(date(2024, 3, 1)),
            Some(RecurrencePattern::weekly(1, vec![5])),
        );
        let visible = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 1));
        assert_eq!(visible.len(), 1);
        assert!(matches!(visible[0], TaskOnDate::Template(_)));
    }

    #[test]
    fn completion_is_per_occurrence_date() {
        let mut t = task(
            "weekly review",
            Some(date(2024, 3, 1)),
            Some(RecurrencePattern::weekly(1, vec![5])),
        );
        t.completed_dates.insert(date(2024, 3, 8));

        let on_8th = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 8));
        assert!(on_8th[0].completed());
        let on_15th = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 15));
        assert!(!on_15th[0].completed());
        // the template's own flag stays untouched
        assert!(!t.completed);
    }

    #[test]
    fn stored_instances_are_skipped() {
        let mut t = task("stray instance", Some(date(2024, 3, 1)), None);
        t.parent_task_id = Some("someone-else".into());
        assert!(tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 1)).is_empty());
    }

    #[test]
    fn instance_date_routes_recurring_toggles() {
        let t = task(
            "weekly review",
            Some(date(2024, 3, 1)),
            Some(RecurrencePattern::weekly(1, vec![5])),
        );
        let visible = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 8));
        assert_eq!(visible[0].instance_date(), Some(date(2024, 3, 8)));

        // anchor-date entry of a recurring template still routes per-date
        let anchor_day = tasks_on_date(std::slice::from_ref(&t), date(2024, 3, 1));
        assert_eq!(anchor_day[0].instance_date(), Some(date(2024, 3, 1)));

        let plain = task("one-off", Some(date(2024, 3, 8)), None);
        let visible = tasks_on_date(std::slice::from_ref(&plain), date(2024, 3, 8));
        assert_eq!(visible[0].instance_date(), None);
    }

    #[test]
    fn range_projection_lists_each_template_once_per_kind() {
        let t = task(
            "daily standup notes",
            Some(date(2024, 3, 4)),
            Some(RecurrencePattern::daily(1)),
        );
        let visible = tasks_in_range(std::slice::from_ref(&t), date(2024, 3, 4), date(2024, 3, 10));
        // anchor-date template entry plus one occurrence entry
        assert_eq!(visible.len(), 2);
        assert!(matches!(visible[0], TaskOnDate::Template(_)));
        let TaskOnDate::Occurrence(occ) = &visible[1] else {
            panic!("expected an occurrence");
        };
        assert_eq!(occ.date, date(2024, 3, 5));
    }

    #[test]
    fn recurring_events_project_like_tasks() {
        let mut event = Event::from_new(NewEvent {
            text: "gym".into(),
            date: date(2024, 3, 4),
            hour: 18,
            ..NewEvent::default()
        });
        event.recurrence = Some(RecurrencePattern::weekly(1, vec![1])); // Mondays

        let visible = events_on_date(std::slice::from_ref(&event), date(2024, 3, 11));
        assert_eq!(visible.len(), 1);
        let EventOnDate::Occurrence(occ) = &visible[0] else {
            panic!("expected an occurrence");
        };
        assert_eq!(occ.parent_id, event.id);
        assert_eq!(occ.date, date(2024, 3, 11));
        assert_eq!(visible[0].template().hour, 18);
    }
}
