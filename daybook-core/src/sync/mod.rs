//! Offline-first synchronization against a remote replica.
//!
//! One engine per authenticated session. The session opens with a full
//! load-and-merge round that converges both replicas on the same snapshot,
//! then settles into steady state: local mutations apply immediately and
//! propagate to the remote fire-and-forget, while remote-origin changes
//! arrive on the live feed and land only when strictly newer than what the
//! session already has.

mod engine;
mod merge;

pub use engine::{Outbound, SyncEngine, SyncState};
pub use merge::{Replicated, merge_journal, merge_records};
