//! Remote store interface.
//!
//! The remote replica is an external collaborator exposing per-collection
//! CRUD plus a live change feed. Field-name translation between the app's
//! JSON and the remote schema is the collaborator's job, not ours.

mod provider;

pub use provider::Provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::DaybookResult;
use crate::event::Event;
use crate::journal::JournalEntry;
use crate::project::Project;
use crate::task::Task;

/// The four synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Tasks,
    Events,
    Journal,
    Projects,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Tasks,
        Collection::Events,
        Collection::Journal,
        Collection::Projects,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Events => "events",
            Collection::Journal => "journal",
            Collection::Projects => "projects",
        }
    }
}

/// A change observed on the remote replica, delivered by the subscription
/// feed. Deleted journal entries are identified by their date key.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    TaskUpserted(Task),
    TaskDeleted(String),
    EventUpserted(Event),
    EventDeleted(String),
    JournalUpserted(JournalEntry),
    JournalDeleted(String),
    ProjectUpserted(Project),
    ProjectDeleted(String),
}

/// Per-collection CRUD against a user's remote replica, plus the live
/// subscription feed.
///
/// None of these carry timeouts: a hung call stays pending. The sync
/// engine's timestamp rule, not call ordering, is what protects against
/// out-of-order completion.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_tasks(&self, user_id: &str) -> DaybookResult<Vec<Task>>;
    async fn fetch_events(&self, user_id: &str) -> DaybookResult<Vec<Event>>;
    async fn fetch_journal(&self, user_id: &str) -> DaybookResult<Vec<JournalEntry>>;
    async fn fetch_projects(&self, user_id: &str) -> DaybookResult<Vec<Project>>;

    async fn upsert_task(&self, user_id: &str, task: &Task) -> DaybookResult<()>;
    async fn delete_task(&self, user_id: &str, id: &str) -> DaybookResult<()>;
    async fn upsert_event(&self, user_id: &str, event: &Event) -> DaybookResult<()>;
    async fn delete_event(&self, user_id: &str, id: &str) -> DaybookResult<()>;
    async fn upsert_journal_entry(
        &self,
        user_id: &str,
        entry: &JournalEntry,
    ) -> DaybookResult<()>;
    async fn upsert_project(&self, user_id: &str, project: &Project) -> DaybookResult<()>;
    async fn delete_project(&self, user_id: &str, id: &str) -> DaybookResult<()>;

    async fn replace_tasks(&self, user_id: &str, tasks: &[Task]) -> DaybookResult<()>;
    async fn replace_events(&self, user_id: &str, events: &[Event]) -> DaybookResult<()>;
    async fn replace_journal(
        &self,
        user_id: &str,
        entries: &[JournalEntry],
    ) -> DaybookResult<()>;
    async fn replace_projects(&self, user_id: &str, projects: &[Project]) -> DaybookResult<()>;

    /// Open the live change feed for one collection. The feed ends when
    /// the receiver is dropped or the transport closes; reconnection is
    /// the transport's concern.
    async fn subscribe(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> DaybookResult<UnboundedReceiver<LiveEvent>>;
}
