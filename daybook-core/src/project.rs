//! Project notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named rich-text notes document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Rich-text HTML as produced by the editor.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Timestamp used for sync conflict resolution.
    pub fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Field mask for `Store::update_project`; same merge rule as
/// [`crate::task::TaskPatch`].
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub content: Option<String>,
}
