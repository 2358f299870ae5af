//! Last-writer-wins reconciliation of local and remote collections.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::journal::JournalEntry;
use crate::project::Project;
use crate::task::Task;

/// A record that can be reconciled across replicas: stable identity plus
/// the timestamp conflicts are decided on (`updatedAt`, falling back to
/// `createdAt`).
pub trait Replicated {
    fn replica_id(&self) -> &str;
    fn modified_at(&self) -> DateTime<Utc>;
}

impl Replicated for Task {
    fn replica_id(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at()
    }
}

impl Replicated for Event {
    fn replica_id(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at()
    }
}

impl Replicated for Project {
    fn replica_id(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at()
    }
}

/// Merge two replicas of an id-keyed collection.
///
/// Ids on only one side are kept as-is. Ids on both sides keep whichever
/// record is strictly newer; a tie keeps the local record. Local ordering
/// is preserved, with remote-only records appended in remote order.
///
/// Concurrent edits to the same record on two devices lose the older
/// edit's delta wholesale; that is the contract, not an accident.
pub fn merge_records<T: Replicated + Clone>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut remote_by_id: HashMap<&str, &T> = remote
        .iter()
        .map(|record| (record.replica_id(), record))
        .collect();

    let mut merged = Vec::with_capacity(local.len() + remote.len());
    for record in local {
        match remote_by_id.remove(record.replica_id()) {
            Some(theirs) if theirs.modified_at() > record.modified_at() => {
                merged.push(theirs.clone());
            }
            _ => merged.push(record.clone()),
        }
    }
    for record in remote {
        if remote_by_id.contains_key(record.replica_id()) {
            merged.push(record.clone());
        }
    }
    merged
}

/// Merge the journal, which is keyed by date rather than id: per date key,
/// the newer entry wins and ties keep local.
pub fn merge_journal(
    local: &BTreeMap<String, JournalEntry>,
    remote: &BTreeMap<String, JournalEntry>,
) -> BTreeMap<String, JournalEntry> {
    let mut merged = local.clone();
    for (key, theirs) in remote {
        match merged.get(key) {
            Some(ours) if theirs.updated_at > ours.updated_at => {
                merged.insert(key.clone(), theirs.clone());
            }
            None => {
                merged.insert(key.clone(), theirs.clone());
            }
            _ => {}
        }
    }
    merged
}
