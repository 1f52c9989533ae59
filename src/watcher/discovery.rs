//! Active session discovery.
//!
//! Locates the most recently written session log in the sessions directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// File extension of session log files.
pub const SESSION_LOG_EXTENSION: &str = "jsonl";

/// Files whose stem contains this marker are treated as archived.
const DELETED_MARKER: &str = "deleted";

/// One agent run's append-only session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Path of the log file. Session identity is this path.
    pub path: PathBuf,
    /// Size in bytes at discovery time.
    pub size: u64,
    /// Discovery time, derived from the file's modification time.
    pub discovered_at: DateTime<Utc>,
}

/// Find the most recently modified session log in a directory.
///
/// Only `.jsonl` files are considered, and files flagged as deleted by
/// naming convention are skipped. Returns `None` when the directory is
/// unreadable or holds no candidates; that is a valid steady state, not
/// an error. Ties on modification time break on path name so the result
/// is deterministic.
#[must_use]
pub fn locate_latest_session(dir: &Path) -> Option<Session> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .filter_map(Result::ok)
        .filter(|entry| is_session_log(&entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some((entry.path(), metadata.len(), modified))
        })
        .max_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)))
        .map(|(path, size, modified)| Session {
            path,
            size,
            discovered_at: DateTime::<Utc>::from(modified),
        })
}

fn is_session_log(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == SESSION_LOG_EXTENSION);
    let is_archived = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.contains(DELETED_MARKER));
    has_extension && !is_archived
}
