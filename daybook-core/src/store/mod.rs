//! The local store: the authoritative in-process collections.
//!
//! Four collections — tasks, events, journal entries keyed by date, and
//! projects — mirrored to the durable key-value layer on every mutation.
//! The store is constructed once and passed by reference to whatever needs
//! it; nothing here is a global.
//!
//! Two groups of methods exist. User-facing mutations (`add_*`,
//! `update_*`, `delete_*`, `reorder_tasks`, …) stamp timestamps and apply
//! domain rules. Replication-side methods (`put_*`, `remove_*`,
//! `install_merged`) write records exactly as given; they exist for the
//! sync engine, which never originates data of its own.

mod kv;

pub use kv::{JsonFileKv, KeyValue, MemoryKv};

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::date::date_key;
use crate::error::{DaybookError, DaybookResult};
use crate::event::{Event, EventPatch, NewEvent};
use crate::journal::JournalEntry;
use crate::project::{Project, ProjectPatch};
use crate::task::{NewTask, Task, TaskPatch};

const TASKS_KEY: &str = "tasks";
const EVENTS_KEY: &str = "events";
const JOURNAL_KEY: &str = "journal";
const PROJECTS_KEY: &str = "projects";

pub struct Store {
    tasks: Vec<Task>,
    events: Vec<Event>,
    journal: BTreeMap<String, JournalEntry>,
    projects: Vec<Project>,
    kv: Box<dyn KeyValue>,
}

impl Store {
    /// Load all collections from the durable layer. Tasks completed before
    /// `completedAt` existed get it backfilled from `createdAt`.
    pub fn open(kv: Box<dyn KeyValue>) -> DaybookResult<Self> {
        let mut tasks: Vec<Task> = load(kv.as_ref(), TASKS_KEY)?;
        let events = load(kv.as_ref(), EVENTS_KEY)?;
        let journal = load(kv.as_ref(), JOURNAL_KEY)?;
        let projects = load(kv.as_ref(), PROJECTS_KEY)?;

        let mut migrated = false;
        for task in &mut tasks {
            if task.completed && task.completed_at.is_none() {
                task.completed_at = Some(task.created_at);
                migrated = true;
            }
        }

        let store = Self {
            tasks,
            events,
            journal,
            projects,
            kv,
        };
        if migrated {
            store.persist_tasks()?;
        }
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn journal(&self) -> &BTreeMap<String, JournalEntry> {
        &self.journal
    }

    pub fn journal_entry(&self, date: NaiveDate) -> Option<&JournalEntry> {
        self.journal.get(&date_key(date))
    }

    /// All journal entries, newest day first.
    pub fn journal_entries(&self) -> Vec<&JournalEntry> {
        // keys are YYYY-MM-DD, so reverse key order is reverse date order
        self.journal.values().rev().collect()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// All projects, most recently updated first.
    pub fn projects_by_recency(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.iter().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        projects
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub fn add_task(&mut self, new: NewTask) -> DaybookResult<Task> {
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            text: new.text,
            completed: false,
            completed_at: None,
            due_date: new.due_date,
            priority: new.priority,
            scheduled_slots: Vec::new(),
            recurrence: new.recurrence,
            completed_dates: Default::default(),
            parent_task_id: None,
            order: self.tasks.len(),
            subtasks: new
                .subtasks
                .into_iter()
                .filter(|s| !s.text.trim().is_empty())
                .collect(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.tasks.push(task.clone());
        self.persist_tasks()?;
        Ok(task)
    }

    /// Merge `patch` into the task and stamp `updatedAt`.
    ///
    /// When `completed` is among the changed fields, the toggle is routed:
    /// a recurring template with an `instance_date` records the date in
    /// `completed_dates` and leaves its own `completed` flag alone; a
    /// non-recurring task flips `completed` and maintains `completedAt`.
    pub fn update_task(
        &mut self,
        id: &str,
        patch: TaskPatch,
        instance_date: Option<NaiveDate>,
    ) -> DaybookResult<Task> {
        let now = Utc::now();
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DaybookError::NotFound(format!("task {id}")))?;

        if let Some(text) = patch.text {
            task.text = text;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(recurrence) = patch.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(subtasks) = patch.subtasks {
            task.subtasks = subtasks;
        }
        if let Some(slots) = patch.scheduled_slots {
            task.scheduled_slots = slots;
        }

        if let Some(done) = patch.completed {
            match (&task.recurrence, instance_date) {
                (Some(_), Some(date)) => {
                    if done {
                        task.completed_dates.insert(date);
                    } else {
                        task.completed_dates.remove(&date);
                    }
                }
                _ => {
                    if done && !task.completed {
                        task.completed_at = Some(now);
                    } else if !done && task.completed {
                        task.completed_at = None;
                    }
                    task.completed = done;
                }
            }
        }

        task.updated_at = Some(now);
        let updated = task.clone();
        self.persist_tasks()?;
        Ok(updated)
    }

    /// Remove a template (and with it every projected occurrence — those
    /// are computed, not stored). Idempotent.
    pub fn delete_task(&mut self, id: &str) -> DaybookResult<()> {
        self.tasks.retain(|t| t.id != id);
        self.persist_tasks()
    }

    /// Reassign `order` from list position. The only sanctioned writer of
    /// the sort key; every id in the collection must appear exactly once.
    pub fn reorder_tasks(&mut self, ordered_ids: &[String]) -> DaybookResult<()> {
        for (index, id) in ordered_ids.iter().enumerate() {
            let task = self
                .tasks
                .iter_mut()
                .find(|t| &t.id == id)
                .ok_or_else(|| DaybookError::NotFound(format!("task {id}")))?;
            task.order = index;
        }
        self.tasks.sort_by_key(|t| t.order);
        self.persist_tasks()
    }

    /// Drop completed non-recurring tasks. Recurring templates are kept;
    /// their per-date completions live in `completed_dates`.
    pub fn clear_completed(&mut self) -> DaybookResult<()> {
        self.tasks.retain(|t| !t.completed);
        self.persist_tasks()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event(&mut self, new: NewEvent) -> DaybookResult<Event> {
        let event = Event::from_new(new);
        self.events.push(event.clone());
        self.persist_events()?;
        Ok(event)
    }

    pub fn update_event(&mut self, id: &str, patch: EventPatch) -> DaybookResult<Event> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DaybookError::NotFound(format!("event {id}")))?;

        if let Some(text) = patch.text {
            event.text = text;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(hour) = patch.hour {
            event.hour = hour;
        }
        if let Some(minutes) = patch.minutes {
            event.minutes = minutes;
        }
        if let Some(end_hour) = patch.end_hour {
            event.end_hour = end_hour;
        }
        if let Some(end_minutes) = patch.end_minutes {
            event.end_minutes = end_minutes;
        }
        if let Some(location) = patch.location {
            event.location = location;
        }
        if let Some(all_day) = patch.all_day {
            event.all_day = all_day;
        }
        if let Some(recurrence) = patch.recurrence {
            event.recurrence = recurrence;
        }

        event.updated_at = Some(Utc::now());
        let updated = event.clone();
        self.persist_events()?;
        Ok(updated)
    }

    pub fn delete_event(&mut self, id: &str) -> DaybookResult<()> {
        self.events.retain(|e| e.id != id);
        self.persist_events()
    }

    // ------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------

    pub fn save_journal_entry(
        &mut self,
        date: NaiveDate,
        content: String,
    ) -> DaybookResult<JournalEntry> {
        let entry = JournalEntry {
            date,
            content,
            updated_at: Utc::now(),
        };
        self.journal.insert(entry.key(), entry.clone());
        self.persist_journal()?;
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub fn add_project(&mut self, name: &str) -> DaybookResult<Project> {
        let now = Utc::now();
        let name = name.trim();
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: if name.is_empty() {
                "Untitled Project".to_string()
            } else {
                name.to_string()
            },
            content: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.projects.push(project.clone());
        self.persist_projects()?;
        Ok(project)
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> DaybookResult<Project> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DaybookError::NotFound(format!("project {id}")))?;

        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(content) = patch.content {
            project.content = content;
        }

        project.updated_at = Utc::now();
        let updated = project.clone();
        self.persist_projects()?;
        Ok(updated)
    }

    pub fn save_project_content(&mut self, id: &str, content: String) -> DaybookResult<Project> {
        self.update_project(
            id,
            ProjectPatch {
                content: Some(content),
                ..ProjectPatch::default()
            },
        )
    }

    pub fn delete_project(&mut self, id: &str) -> DaybookResult<()> {
        self.projects.retain(|p| p.id != id);
        self.persist_projects()
    }

    // ------------------------------------------------------------------
    // Replication side (sync engine only)
    // ------------------------------------------------------------------

    /// Insert or replace a task exactly as given.
    pub fn put_task(&mut self, task: Task) -> DaybookResult<()> {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
        self.persist_tasks()
    }

    pub fn remove_task(&mut self, id: &str) -> DaybookResult<()> {
        self.tasks.retain(|t| t.id != id);
        self.persist_tasks()
    }

    pub fn put_event(&mut self, event: Event) -> DaybookResult<()> {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
        self.persist_events()
    }

    pub fn remove_event(&mut self, id: &str) -> DaybookResult<()> {
        self.events.retain(|e| e.id != id);
        self.persist_events()
    }

    pub fn put_journal_entry(&mut self, entry: JournalEntry) -> DaybookResult<()> {
        self.journal.insert(entry.key(), entry);
        self.persist_journal()
    }

    pub fn remove_journal_entry(&mut self, key: &str) -> DaybookResult<()> {
        self.journal.remove(key);
        self.persist_journal()
    }

    pub fn put_project(&mut self, project: Project) -> DaybookResult<()> {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => *slot = project,
            None => self.projects.push(project),
        }
        self.persist_projects()
    }

    pub fn remove_project(&mut self, id: &str) -> DaybookResult<()> {
        self.projects.retain(|p| p.id != id);
        self.persist_projects()
    }

    /// Replace every collection with a merged snapshot and persist all
    /// four.
    pub fn install_merged(
        &mut self,
        tasks: Vec<Task>,
        events: Vec<Event>,
        journal: BTreeMap<String, JournalEntry>,
        projects: Vec<Project>,
    ) -> DaybookResult<()> {
        self.tasks = tasks;
        self.events = events;
        self.journal = journal;
        self.projects = projects;
        self.persist_tasks()?;
        self.persist_events()?;
        self.persist_journal()?;
        self.persist_projects()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn persist_tasks(&self) -> DaybookResult<()> {
        persist(self.kv.as_ref(), TASKS_KEY, &self.tasks)
    }

    fn persist_events(&self) -> DaybookResult<()> {
        persist(self.kv.as_ref(), EVENTS_KEY, &self.events)
    }

    fn persist_journal(&self) -> DaybookResult<()> {
        persist(self.kv.as_ref(), JOURNAL_KEY, &self.journal)
    }

    fn persist_projects(&self) -> DaybookResult<()> {
        persist(self.kv.as_ref(), PROJECTS_KEY, &self.projects)
    }
}

fn load<T: DeserializeOwned + Default>(kv: &dyn KeyValue, key: &str) -> DaybookResult<T> {
    match kv.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(T::default()),
    }
}

fn persist<T: Serialize>(kv: &dyn KeyValue, key: &str, value: &T) -> DaybookResult<()> {
    kv.set(key, &serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrencePattern;
    use crate::task::Subtask;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_store() -> Store {
        Store::open(Box::new(MemoryKv::new())).unwrap()
    }

    #[test]
    fn add_task_appends_with_dense_order() {
        let mut store = empty_store();
        let a = store.add_task(NewTask::text("first")).unwrap();
        let b = store.add_task(NewTask::text("second")).unwrap();
        assert_eq!(a.order, 0);
        assert_eq!(b.order, 1);
        assert!(!a.completed);
        assert!(a.updated_at.is_none());
    }

    #[test]
    fn add_task_drops_blank_subtasks() {
        let mut store = empty_store();
        let task = store
            .add_task(NewTask {
                text: "with subtasks".into(),
                subtasks: vec![Subtask::new("real"), Subtask::new("   ")],
                ..NewTask::default()
            })
            .unwrap();
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].text, "real");
    }

    #[test]
    fn completing_a_plain_task_sets_completed_at() {
        let mut store = empty_store();
        let task = store.add_task(NewTask::text("one-off")).unwrap();

        let done = store
            .update_task(&task.id, TaskPatch::completed(true), None)
            .unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert!(done.updated_at.is_some());

        let undone = store
            .update_task(&task.id, TaskPatch::completed(false), None)
            .unwrap();
        assert!(!undone.completed);
        assert_eq!(undone.completed_at, None);
    }

    #[test]
    fn completing_a_recurring_instance_only_touches_completed_dates() {
        let mut store = empty_store();
        let task = store
            .add_task(NewTask {
                text: "weekly review".into(),
                due_date: Some(date(2024, 3, 1)),
                recurrence: Some(RecurrencePattern::weekly(1, vec![5])),
                ..NewTask::default()
            })
            .unwrap();

        let updated = store
            .update_task(
                &task.id,
                TaskPatch::completed(true),
                Some(date(2024, 3, 8)),
            )
            .unwrap();
        assert!(!updated.completed);
        assert_eq!(updated.completed_at, None);
        assert!(updated.completed_dates.contains(&date(2024, 3, 8)));
        assert!(!updated.completed_dates.contains(&date(2024, 3, 15)));

        // toggling off removes exactly that date
        let updated = store
            .update_task(
                &task.id,
                TaskPatch::completed(false),
                Some(date(2024, 3, 8)),
            )
            .unwrap();
        assert!(updated.completed_dates.is_empty());
        assert!(!updated.completed);
    }

    #[test]
    fn update_unknown_task_is_an_error() {
        let mut store = empty_store();
        let err = store
            .update_task("missing", TaskPatch::completed(true), None)
            .unwrap_err();
        assert!(matches!(err, DaybookError::NotFound(_)));
    }

    #[test]
    fn reorder_assigns_positional_order_and_is_stable() {
        let mut store = empty_store();
        let a = store.add_task(NewTask::text("a")).unwrap();
        let b = store.add_task(NewTask::text("b")).unwrap();
        let c = store.add_task(NewTask::text("c")).unwrap();

        let permuted = vec![c.id.clone(), a.id.clone(), b.id.clone()];
        store.reorder_tasks(&permuted).unwrap();
        let orders: Vec<(String, usize)> = store
            .tasks()
            .iter()
            .map(|t| (t.text.clone(), t.order))
            .collect();
        assert_eq!(
            orders,
            vec![("c".into(), 0), ("a".into(), 1), ("b".into(), 2)]
        );

        // a no-op reorder changes nothing
        store.reorder_tasks(&permuted).unwrap();
        let again: Vec<(String, usize)> = store
            .tasks()
            .iter()
            .map(|t| (t.text.clone(), t.order))
            .collect();
        assert_eq!(orders, again);
    }

    #[test]
    fn clear_completed_keeps_recurring_templates() {
        let mut store = empty_store();
        let plain = store.add_task(NewTask::text("plain")).unwrap();
        let recurring = store
            .add_task(NewTask {
                text: "recurring".into(),
                due_date: Some(date(2024, 3, 1)),
                recurrence: Some(RecurrencePattern::daily(1)),
                ..NewTask::default()
            })
            .unwrap();

        store
            .update_task(&plain.id, TaskPatch::completed(true), None)
            .unwrap();
        store
            .update_task(
                &recurring.id,
                TaskPatch::completed(true),
                Some(date(2024, 3, 1)),
            )
            .unwrap();

        store.clear_completed().unwrap();
        assert!(store.task(&plain.id).is_none());
        assert!(store.task(&recurring.id).is_some());
    }

    #[test]
    fn mutations_write_through_to_the_durable_layer() {
        let kv = MemoryKv::new();
        let raw = {
            let mut store = Store::open(Box::new(kv)).unwrap();
            store.add_task(NewTask::text("persisted")).unwrap();
            store
                .save_journal_entry(date(2024, 5, 1), "<p>hi</p>".into())
                .unwrap();
            store.kv.get(TASKS_KEY).unwrap().unwrap()
        };
        let tasks: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "persisted");
    }

    #[test]
    fn open_backfills_completed_at() {
        // a completed record persisted before completedAt existed
        let kv = MemoryKv::new();
        let task = Task {
            id: "t1".into(),
            text: "legacy".into(),
            completed: true,
            completed_at: None,
            due_date: None,
            priority: None,
            scheduled_slots: Vec::new(),
            recurrence: None,
            completed_dates: Default::default(),
            parent_task_id: None,
            order: 0,
            subtasks: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        };
        kv.set(TASKS_KEY, &serde_json::to_string(&vec![task]).unwrap())
            .unwrap();
        let store = Store::open(Box::new(kv)).unwrap();
        assert_eq!(
            store.task("t1").unwrap().completed_at,
            Some(store.task("t1").unwrap().created_at)
        );
    }

    #[test]
    fn events_merge_and_restamp() {
        let mut store = empty_store();
        let event = store
            .add_event(NewEvent {
                text: "standup".into(),
                date: date(2024, 4, 2),
                hour: 9,
                minutes: 30,
                ..NewEvent::default()
            })
            .unwrap();
        assert_eq!(event.end_minutes, 0);
        assert!(event.updated_at.is_none());

        let updated = store
            .update_event(
                &event.id,
                EventPatch {
                    location: Some(Some("room 4".into())),
                    end_hour: Some(Some(10)),
                    ..EventPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.location.as_deref(), Some("room 4"));
        assert_eq!(updated.end_hour, Some(10));
        assert_eq!(updated.hour, 9);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn journal_entries_list_newest_first() {
        let mut store = empty_store();
        store
            .save_journal_entry(date(2024, 1, 2), "a".into())
            .unwrap();
        store
            .save_journal_entry(date(2024, 3, 1), "b".into())
            .unwrap();
        store
            .save_journal_entry(date(2024, 2, 10), "c".into())
            .unwrap();

        let dates: Vec<NaiveDate> = store.journal_entries().iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 3, 1), date(2024, 2, 10), date(2024, 1, 2)]
        );
    }

    #[test]
    fn projects_crud_and_recency_order() {
        let mut store = empty_store();
        let a = store.add_project("Alpha").unwrap();
        let b = store.add_project("  ").unwrap();
        assert_eq!(b.name, "Untitled Project");

        store
            .save_project_content(&a.id, "<p>notes</p>".into())
            .unwrap();
        let recent = store.projects_by_recency();
        assert_eq!(recent[0].id, a.id);

        store.delete_project(&b.id).unwrap();
        assert!(store.project(&b.id).is_none());
    }
}
