//! API request and response types for the dashboard HTTP endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response for GET /api/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `RUNNING` or `STOPPED`.
    pub status: String,
    pub running: bool,
    pub timestamp: DateTime<Utc>,
}

impl StatusResponse {
    /// Create a status response from the probe result.
    #[must_use]
    pub fn new(running: bool) -> Self {
        Self {
            status: if running { "RUNNING" } else { "STOPPED" }.to_string(),
            running,
            timestamp: Utc::now(),
        }
    }
}

/// Query parameters for GET /api/files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesQuery {
    /// Path relative to the workspace root; empty for the root itself.
    #[serde(default)]
    pub path: String,
}

/// Response for GET /api/files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    pub path: String,
    pub items: Vec<FileEntry>,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Freshness annotation, when the entry was recently touched.
    pub status: Option<Freshness>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Folder,
}

/// Freshness annotation for directory entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Created today.
    New,
    /// Modified within the last five minutes.
    Modified,
}

/// Annotate an entry based on its timestamps.
#[must_use]
pub fn freshness(
    modified: Option<DateTime<Utc>>,
    created: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Freshness> {
    if let Some(modified) = modified {
        if now.signed_duration_since(modified) < chrono::Duration::minutes(5) {
            return Some(Freshness::Modified);
        }
    }

    let midnight = now.date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    if let (Some(created), Some(midnight)) = (created, midnight) {
        if created >= midnight {
            return Some(Freshness::New);
        }
    }

    None
}

/// Response for DELETE /api/tasks/{id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub ok: bool,
}
