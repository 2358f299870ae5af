//! Core engine for daybook: tasks, events, journal and project notes with
//! recurring-occurrence projection, a durable local store, and an
//! offline-first synchronization engine.
//!
//! The store owns the canonical template collections; occurrences of
//! recurring templates are computed on demand and never persisted. Sync is
//! local-first: mutations always land locally and synchronously, remote
//! propagation is eventual and reconciled by last-writer-wins timestamps.

pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod journal;
pub mod occurrence;
pub mod project;
pub mod recurrence;
pub mod remote;
pub mod store;
pub mod sync;
pub mod task;

pub use error::{DaybookError, DaybookResult};
