//! Provider subprocess protocol.
//!
//! Remote replicas are reached through external provider binaries
//! (e.g. `daybook-provider-rest`) speaking JSON over stdin/stdout, so any
//! executable that implements the protocol can back the sync engine.
//! Providers own their credentials and schema mapping; we pass records in
//! the app's JSON shape and the user id on every request.
//!
//! CRUD requests are one process invocation each: one request line on
//! stdin, one response object on stdout. `subscribe` is long-lived: the
//! provider keeps running and emits one change object per stdout line.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

use crate::error::{DaybookError, DaybookResult};
use crate::event::Event;
use crate::journal::JournalEntry;
use crate::project::Project;
use crate::remote::{Collection, LiveEvent, RemoteStore};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Op {
    FetchAll,
    UpsertOne,
    DeleteOne,
    BulkReplace,
    Subscribe,
}

/// Request sent to the provider.
#[derive(Debug, Serialize)]
struct Request<'a> {
    op: Op,
    collection: Collection,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<serde_json::Value>,
}

impl<'a> Request<'a> {
    fn new(op: Op, collection: Collection, user_id: &'a str) -> Self {
        Self {
            op,
            collection,
            user_id,
            record: None,
            id: None,
            records: None,
        }
    }
}

/// Response from the provider.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response {
    Success {
        #[serde(default)]
        data: serde_json::Value,
    },
    Error {
        error: String,
    },
}

/// One line of the subscription stream.
#[derive(Debug, Deserialize)]
struct WireChange {
    #[serde(rename = "type")]
    kind: ChangeKind,
    record: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A remote store backed by a `daybook-provider-<name>` binary.
#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn binary_path(&self) -> DaybookResult<std::path::PathBuf> {
        let binary_name = format!("daybook-provider-{}", self.name);
        which::which(&binary_name)
            .map_err(|_| DaybookError::ProviderNotInstalled(binary_name))
    }

    /// One-shot call: spawn, send the request, collect the response.
    ///
    /// Deliberately no timeout — a hung provider leaves the future
    /// pending, and the caller's timestamp rule copes with whatever
    /// completion order the transport produces.
    async fn call(&self, request: Request<'_>) -> DaybookResult<serde_json::Value> {
        let request_json = serde_json::to_string(&request)?;
        let binary_path = self.binary_path()?;

        let mut child = Command::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                DaybookError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        // stdin was piped above
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(DaybookError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(DaybookError::Provider("Provider returned no response".into()));
        }

        let response: Response = serde_json::from_str(response_str.trim())
            .map_err(|e| DaybookError::Provider(format!("Failed to parse response: {e}")))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(DaybookError::Provider(error)),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> DaybookResult<Vec<T>> {
        let data = self
            .call(Request::new(Op::FetchAll, collection, user_id))
            .await?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(data)?)
    }

    async fn upsert<T: Serialize>(
        &self,
        user_id: &str,
        collection: Collection,
        record: &T,
    ) -> DaybookResult<()> {
        let mut request = Request::new(Op::UpsertOne, collection, user_id);
        request.record = Some(serde_json::to_value(record)?);
        self.call(request).await?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, collection: Collection, id: &str) -> DaybookResult<()> {
        let mut request = Request::new(Op::DeleteOne, collection, user_id);
        request.id = Some(id);
        self.call(request).await?;
        Ok(())
    }

    async fn replace<T: Serialize>(
        &self,
        user_id: &str,
        collection: Collection,
        records: &[T],
    ) -> DaybookResult<()> {
        let mut request = Request::new(Op::BulkReplace, collection, user_id);
        request.records = Some(serde_json::to_value(records)?);
        self.call(request).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for Provider {
    async fn fetch_tasks(&self, user_id: &str) -> DaybookResult<Vec<Task>> {
        self.fetch(user_id, Collection::Tasks).await
    }

    async fn fetch_events(&self, user_id: &str) -> DaybookResult<Vec<Event>> {
        self.fetch(user_id, Collection::Events).await
    }

    async fn fetch_journal(&self, user_id: &str) -> DaybookResult<Vec<JournalEntry>> {
        self.fetch(user_id, Collection::Journal).await
    }

    async fn fetch_projects(&self, user_id: &str) -> DaybookResult<Vec<Project>> {
        self.fetch(user_id, Collection::Projects).await
    }

    async fn upsert_task(&self, user_id: &str, task: &Task) -> DaybookResult<()> {
        self.upsert(user_id, Collection::Tasks, task).await
    }

    async fn delete_task(&self, user_id: &str, id: &str) -> DaybookResult<()> {
        self.delete(user_id, Collection::Tasks, id).await
    }

    async fn upsert_event(&self, user_id: &str, event: &Event) -> DaybookResult<()> {
        self.upsert(user_id, Collection::Events, event).await
    }

    async fn delete_event(&self, user_id: &str, id: &str) -> DaybookResult<()> {
        self.delete(user_id, Collection::Events, id).await
    }

    async fn upsert_journal_entry(
        &self,
        user_id: &str,
        entry: &JournalEntry,
    ) -> DaybookResult<()> {
        self.upsert(user_id, Collection::Journal, entry).await
    }

    async fn upsert_project(&self, user_id: &str, project: &Project) -> DaybookResult<()> {
        self.upsert(user_id, Collection::Projects, project).await
    }

    async fn delete_project(&self, user_id: &str, id: &str) -> DaybookResult<()> {
        self.delete(user_id, Collection::Projects, id).await
    }

    async fn replace_tasks(&self, user_id: &str, tasks: &[Task]) -> DaybookResult<()> {
        self.replace(user_id, Collection::Tasks, tasks).await
    }

    async fn replace_events(&self, user_id: &str, events: &[Event]) -> DaybookResult<()> {
        self.replace(user_id, Collection::Events, events).await
    }

    async fn replace_journal(
        &self,
        user_id: &str,
        entries: &[JournalEntry],
    ) -> DaybookResult<()> {
        self.replace(user_id, Collection::Journal, entries).await
    }

    async fn replace_projects(&self, user_id: &str, projects: &[Project]) -> DaybookResult<()> {
        self.replace(user_id, Collection::Projects, projects).await
    }

    async fn subscribe(
        &self,
        user_id: &str,
        collection: Collection,
    ) -> DaybookResult<UnboundedReceiver<LiveEvent>> {
        let request_json =
            serde_json::to_string(&Request::new(Op::Subscribe, collection, user_id))?;
        let binary_path = self.binary_path()?;

        let mut child = Command::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DaybookError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DaybookError::Provider("Provider stdout unavailable".into()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            // owning the child here ties its lifetime to the stream
            let _child = child;
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<WireChange>(line)
                            .map_err(DaybookError::from)
                            .and_then(|change| live_event(collection, change))
                        {
                            Ok(event) => {
                                if tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                warn!(collection = collection.name(), error = %err, "dropping malformed change notification");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(collection = collection.name(), error = %err, "subscription stream error");
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn live_event(collection: Collection, change: WireChange) -> DaybookResult<LiveEvent> {
    if change.kind == ChangeKind::Delete {
        // deletions carry only the record key
        let key_field = match collection {
            Collection::Journal => "date",
            _ => "id",
        };
        let key = change
            .record
            .get(key_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                DaybookError::Provider(format!("delete notification without {key_field}"))
            })?
            .to_string();
        return Ok(match collection {
            Collection::Tasks => LiveEvent::TaskDeleted(key),
            Collection::Events => LiveEvent::EventDeleted(key),
            Collection::Journal => LiveEvent::JournalDeleted(key),
            Collection::Projects => LiveEvent::ProjectDeleted(key),
        });
    }

    Ok(match collection {
        Collection::Tasks => LiveEvent::TaskUpserted(serde_json::from_value(change.record)?),
        Collection::Events => LiveEvent::EventUpserted(serde_json::from_value(change.record)?),
        Collection::Journal => LiveEvent::JournalUpserted(serde_json::from_value(change.record)?),
        Collection::Projects => {
            LiveEvent::ProjectUpserted(serde_json::from_value(change.record)?)
        }
    })
}
