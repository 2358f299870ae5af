//! The per-session sync engine.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::warn;

use crate::error::DaybookResult;
use crate::event::Event;
use crate::journal::JournalEntry;
use crate::project::Project;
use crate::remote::{LiveEvent, RemoteStore};
use crate::store::Store;
use crate::sync::merge::{merge_journal, merge_records};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsynced,
    Loading,
    Merging,
    Synced,
}

/// A queued remote write. Journal entries are never deleted locally, so
/// there is no journal delete variant.
#[derive(Debug, Clone)]
pub enum Outbound {
    UpsertTask(Task),
    DeleteTask(String),
    UpsertEvent(Event),
    DeleteEvent(String),
    UpsertJournal(JournalEntry),
    UpsertProject(Project),
    DeleteProject(String),
}

/// Reconciles the local store against the remote replica for one
/// authenticated session.
///
/// The engine never originates data: it reads snapshots, merges, and
/// writes merged results. The store is handed in by the caller — the
/// engine holds no reference of its own.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    user_id: String,
    state: SyncState,
    outbound: VecDeque<Outbound>,
    push_in_flight: bool,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteStore>, user_id: impl Into<String>) -> Self {
        Self {
            remote,
            user_id: user_id.into(),
            state: SyncState::Unsynced,
            outbound: VecDeque::new(),
            push_in_flight: false,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn pending_pushes(&self) -> usize {
        self.outbound.len()
    }

    /// Run the session-start round: fetch both replicas, merge with
    /// last-writer-wins, install the result locally, and push it wholesale
    /// back to the remote so both sides converge in the same round.
    ///
    /// A collection whose remote fetch fails is treated as absent remotely;
    /// the other three proceed.
    pub async fn start(&mut self, store: &mut Store) -> DaybookResult<()> {
        self.state = SyncState::Loading;
        let user = self.user_id.clone();

        let (tasks, events, journal, projects) = tokio::join!(
            self.remote.fetch_tasks(&user),
            self.remote.fetch_events(&user),
            self.remote.fetch_journal(&user),
            self.remote.fetch_projects(&user),
        );
        let remote_tasks = tasks.unwrap_or_else(|err| {
            warn!(collection = "tasks", error = %err, "remote fetch failed, treating as empty");
            Vec::new()
        });
        let remote_events = events.unwrap_or_else(|err| {
            warn!(collection = "events", error = %err, "remote fetch failed, treating as empty");
            Vec::new()
        });
        let remote_journal = journal.unwrap_or_else(|err| {
            warn!(collection = "journal", error = %err, "remote fetch failed, treating as empty");
            Vec::new()
        });
        let remote_projects = projects.unwrap_or_else(|err| {
            warn!(collection = "projects", error = %err, "remote fetch failed, treating as empty");
            Vec::new()
        });

        self.state = SyncState::Merging;
        let remote_journal: BTreeMap<String, JournalEntry> = remote_journal
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();

        let tasks = merge_records(store.tasks(), &remote_tasks);
        let events = merge_records(store.events(), &remote_events);
        let journal = merge_journal(store.journal(), &remote_journal);
        let projects = merge_records(store.projects(), &remote_projects);

        store.install_merged(
            tasks.clone(),
            events.clone(),
            journal.clone(),
            projects.clone(),
        )?;

        if let Err(err) = self.remote.replace_tasks(&user, &tasks).await {
            warn!(collection = "tasks", error = %err, "failed to push merged snapshot");
        }
        if let Err(err) = self.remote.replace_events(&user, &events).await {
            warn!(collection = "events", error = %err, "failed to push merged snapshot");
        }
        let journal_entries: Vec<JournalEntry> = journal.into_values().collect();
        if let Err(err) = self.remote.replace_journal(&user, &journal_entries).await {
            warn!(collection = "journal", error = %err, "failed to push merged snapshot");
        }
        if let Err(err) = self.remote.replace_projects(&user, &projects).await {
            warn!(collection = "projects", error = %err, "failed to push merged snapshot");
        }

        self.state = SyncState::Synced;
        Ok(())
    }

    /// Queue a remote write for a mutation the store has already applied.
    /// Never blocks and never fails; the queue drains on [`Self::flush`].
    pub fn enqueue(&mut self, op: Outbound) {
        self.outbound.push_back(op);
    }

    /// Drain the outbound queue, one record at a time.
    ///
    /// Fire-and-forget: a failed push is logged and dropped, never
    /// retried, and never rolls back the local mutation. While a drain is
    /// in flight, or before the session reaches `Synced`, further calls
    /// return without touching the queue — the in-flight marker is what
    /// keeps a push from being issued twice.
    pub async fn flush(&mut self) {
        if self.push_in_flight || self.state != SyncState::Synced {
            return;
        }
        self.push_in_flight = true;
        while let Some(op) = self.outbound.pop_front() {
            if let Err(err) = self.push(&op).await {
                warn!(error = %err, "remote push failed");
            }
        }
        self.push_in_flight = false;
    }

    async fn push(&self, op: &Outbound) -> DaybookResult<()> {
        let user = self.user_id.as_str();
        match op {
            Outbound::UpsertTask(task) => self.remote.upsert_task(user, task).await,
            Outbound::DeleteTask(id) => self.remote.delete_task(user, id).await,
            Outbound::UpsertEvent(event) => self.remote.upsert_event(user, event).await,
            Outbound::DeleteEvent(id) => self.remote.delete_event(user, id).await,
            Outbound::UpsertJournal(entry) => {
                self.remote.upsert_journal_entry(user, entry).await
            }
            Outbound::UpsertProject(project) => {
                self.remote.upsert_project(user, project).await
            }
            Outbound::DeleteProject(id) => self.remote.delete_project(user, id).await,
        }
    }

    /// Apply one remote-origin change notification.
    ///
    /// Deletes remove the local record outright. Upserts land only when
    /// the incoming record is strictly newer than the local one (or the
    /// record is new locally) — an echo of this session's own write can
    /// never clobber a newer local edit that raced ahead of it.
    pub fn apply_live(&self, store: &mut Store, event: LiveEvent) -> DaybookResult<()> {
        match event {
            LiveEvent::TaskDeleted(id) => store.remove_task(&id),
            LiveEvent::TaskUpserted(task) => {
                let newer = store
                    .task(&task.id)
                    .is_none_or(|current| task.modified_at() > current.modified_at());
                if newer { store.put_task(task) } else { Ok(()) }
            }
            LiveEvent::EventDeleted(id) => store.remove_event(&id),
            LiveEvent::EventUpserted(event) => {
                let newer = store
                    .event(&event.id)
                    .is_none_or(|current| event.modified_at() > current.modified_at());
                if newer { store.put_event(event) } else { Ok(()) }
            }
            LiveEvent::JournalDeleted(key) => store.remove_journal_entry(&key),
            LiveEvent::JournalUpserted(entry) => {
                let newer = store
                    .journal_entry(entry.date)
                    .is_none_or(|current| entry.updated_at > current.updated_at);
                if newer { store.put_journal_entry(entry) } else { Ok(()) }
            }
            LiveEvent::ProjectDeleted(id) => store.remove_project(&id),
            LiveEvent::ProjectUpserted(project) => {
                let newer = store
                    .project(&project.id)
                    .is_none_or(|current| project.modified_at() > current.modified_at());
                if newer { store.put_project(project) } else { Ok(()) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Collection;
    use crate::store::MemoryKv;
    use crate::task::{NewTask, TaskPatch};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// In-memory remote replica with per-collection failure injection.
    #[derive(Default)]
    struct FakeRemote {
        tasks: Mutex<Vec<Task>>,
        events: Mutex<Vec<Event>>,
        journal: Mutex<Vec<JournalEntry>>,
        projects: Mutex<Vec<Project>>,
        fail_task_fetch: bool,
        upserted_tasks: Mutex<Vec<String>>,
        deleted_tasks: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn fetch_tasks(&self, _user: &str) -> DaybookResult<Vec<Task>> {
            if self.fail_task_fetch {
                return Err(crate::error::DaybookError::Provider("boom".into()));
            }
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn fetch_events(&self, _user: &str) -> DaybookResult<Vec<Event>> {
            Ok(self.events.lock().unwrap().clone())
        }

        async fn fetch_journal(&self, _user: &str) -> DaybookResult<Vec<JournalEntry>> {
            Ok(self.journal.lock().unwrap().clone())
        }

        async fn fetch_projects(&self, _user: &str) -> DaybookResult<Vec<Project>> {
            Ok(self.projects.lock().unwrap().clone())
        }

        async fn upsert_task(&self, _user: &str, task: &Task) -> DaybookResult<()> {
            self.upserted_tasks.lock().unwrap().push(task.id.clone());
            Ok(())
        }

        async fn delete_task(&self, _user: &str, id: &str) -> DaybookResult<()> {
            self.deleted_tasks.lock().unwrap().push(id.to_string());
            Ok(())
        }

        async fn upsert_event(&self, _user: &str, _event: &Event) -> DaybookResult<()> {
            Ok(())
        }

        async fn delete_event(&self, _user: &str, _id: &str) -> DaybookResult<()> {
            Ok(())
        }

        async fn upsert_journal_entry(
            &self,
            _user: &str,
            _entry: &JournalEntry,
        ) -> DaybookResult<()> {
            Ok(())
        }

        async fn upsert_project(&self, _user: &str, _project: &Project) -> DaybookResult<()> {
            Ok(())
        }

        async fn delete_project(&self, _user: &str, _id: &str) -> DaybookResult<()> {
            Ok(())
        }

        async fn replace_tasks(&self, _user: &str, tasks: &[Task]) -> DaybookResult<()> {
            *self.tasks.lock().unwrap() = tasks.to_vec();
            Ok(())
        }

        async fn replace_events(&self, _user: &str, events: &[Event]) -> DaybookResult<()> {
            *self.events.lock().unwrap() = events.to_vec();
            Ok(())
        }

        async fn replace_journal(
            &self,
            _user: &str,
            entries: &[JournalEntry],
        ) -> DaybookResult<()> {
            *self.journal.lock().unwrap() = entries.to_vec();
            Ok(())
        }

        async fn replace_projects(&self, _user: &str, projects: &[Project]) -> DaybookResult<()> {
            *self.projects.lock().unwrap() = projects.to_vec();
            Ok(())
        }

        async fn subscribe(
            &self,
            _user: &str,
            _collection: Collection,
        ) -> DaybookResult<UnboundedReceiver<LiveEvent>> {
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            Ok(rx)
        }
    }

    fn empty_store() -> Store {
        Store::open(Box::new(MemoryKv::new())).unwrap()
    }

    fn remote_task(id: &str, text: &str, hour: u32) -> Task {
        Task {
            id: id.into(),
            text: text.into(),
            completed: false,
            completed_at: None,
            due_date: None,
            priority: None,
            scheduled_slots: Vec::new(),
            recurrence: None,
            completed_dates: Default::default(),
            parent_task_id: None,
            order: 0,
            subtasks: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn session_start_converges_both_replicas() {
        let mut store = empty_store();
        let local = store.add_task(NewTask::text("local-only")).unwrap();

        let remote = Arc::new(FakeRemote::default());
        remote
            .tasks
            .lock()
            .unwrap()
            .push(remote_task("r1", "remote-only", 1));

        let mut engine = SyncEngine::new(remote.clone(), "user-1");
        assert_eq!(engine.state(), SyncState::Unsynced);
        engine.start(&mut store).await.unwrap();
        assert_eq!(engine.state(), SyncState::Synced);

        // both records everywhere
        let local_ids: Vec<&str> = store.tasks().iter().map(|t| t.id.as_str()).collect();
        assert!(local_ids.contains(&local.id.as_str()));
        assert!(local_ids.contains(&"r1"));

        let remote_ids: Vec<String> = remote
            .tasks
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert!(remote_ids.contains(&local.id));
        assert!(remote_ids.contains(&"r1".to_string()));
    }

    #[tokio::test]
    async fn one_failed_fetch_does_not_block_other_collections() {
        let mut store = empty_store();
        store.add_task(NewTask::text("survives")).unwrap();

        let remote = Arc::new(FakeRemote {
            fail_task_fetch: true,
            ..FakeRemote::default()
        });
        remote.projects.lock().unwrap().push(Project {
            id: "p1".into(),
            name: "remote project".into(),
            content: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let mut engine = SyncEngine::new(remote.clone(), "user-1");
        engine.start(&mut store).await.unwrap();

        assert_eq!(engine.state(), SyncState::Synced);
        // tasks fell back to "remote had nothing": local task survives
        assert_eq!(store.tasks().len(), 1);
        // projects still merged in
        assert!(store.project("p1").is_some());
    }

    #[tokio::test]
    async fn flush_is_suppressed_until_synced() {
        let remote = Arc::new(FakeRemote::default());
        let mut engine = SyncEngine::new(remote.clone(), "user-1");

        engine.enqueue(Outbound::DeleteTask("t1".into()));
        engine.flush().await;
        // not synced yet: nothing was sent, nothing was lost
        assert_eq!(engine.pending_pushes(), 1);
        assert!(remote.deleted_tasks.lock().unwrap().is_empty());

        let mut store = empty_store();
        engine.start(&mut store).await.unwrap();
        engine.flush().await;
        assert_eq!(engine.pending_pushes(), 0);
        assert_eq!(*remote.deleted_tasks.lock().unwrap(), vec!["t1".to_string()]);
    }

    #[tokio::test]
    async fn flush_drains_in_order_and_push_failures_do_not_retry() {
        let remote = Arc::new(FakeRemote::default());
        let mut store = empty_store();
        let mut engine = SyncEngine::new(remote.clone(), "user-1");
        engine.start(&mut store).await.unwrap();

        let a = store.add_task(NewTask::text("a")).unwrap();
        let b = store.add_task(NewTask::text("b")).unwrap();
        engine.enqueue(Outbound::UpsertTask(a.clone()));
        engine.enqueue(Outbound::UpsertTask(b.clone()));
        engine.flush().await;

        assert_eq!(*remote.upserted_tasks.lock().unwrap(), vec![a.id, b.id]);
        assert_eq!(engine.pending_pushes(), 0);
    }

    #[tokio::test]
    async fn live_upsert_applies_only_when_strictly_newer() {
        let remote = Arc::new(FakeRemote::default());
        let mut store = empty_store();
        let mut engine = SyncEngine::new(remote, "user-1");
        engine.start(&mut store).await.unwrap();

        let task = store.add_task(NewTask::text("mine")).unwrap();
        let fresh = store
            .update_task(&task.id, TaskPatch::text_to("mine, edited"), None)
            .unwrap();

        // an echo of the pre-edit record arrives late: ignored
        let mut stale = fresh.clone();
        stale.text = "stale echo".into();
        stale.updated_at = Some(fresh.modified_at() - chrono::Duration::seconds(5));
        engine
            .apply_live(&mut store, LiveEvent::TaskUpserted(stale))
            .unwrap();
        assert_eq!(store.task(&task.id).unwrap().text, "mine, edited");

        // a genuinely newer remote edit lands
        let mut newer = fresh.clone();
        newer.text = "other device".into();
        newer.updated_at = Some(fresh.modified_at() + chrono::Duration::seconds(5));
        engine
            .apply_live(&mut store, LiveEvent::TaskUpserted(newer))
            .unwrap();
        assert_eq!(store.task(&task.id).unwrap().text, "other device");

        // unknown records are simply added
        engine
            .apply_live(
                &mut store,
                LiveEvent::TaskUpserted(remote_task("new", "from elsewhere", 1)),
            )
            .unwrap();
        assert!(store.task("new").is_some());
    }

    #[tokio::test]
    async fn live_delete_removes_outright() {
        let remote = Arc::new(FakeRemote::default());
        let mut store = empty_store();
        let mut engine = SyncEngine::new(remote, "user-1");
        engine.start(&mut store).await.unwrap();

        let task = store.add_task(NewTask::text("doomed")).unwrap();
        engine
            .apply_live(&mut store, LiveEvent::TaskDeleted(task.id.clone()))
            .unwrap();
        assert!(store.task(&task.id).is_none());

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        store.save_journal_entry(date, "today".into()).unwrap();
        engine
            .apply_live(&mut store, LiveEvent::JournalDeleted("2024-06-01".into()))
            .unwrap();
        assert!(store.journal_entry(date).is_none());
    }
}
