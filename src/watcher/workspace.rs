//! Workspace file change watching.
//!
//! Observes the workspace directory tree and publishes coarse-grained
//! change events to the `files` broadcast channel. The watcher is
//! best-effort: it ignores pre-existing content, does not coalesce rapid
//! repeated events on the same path, and an initialization failure
//! disables the feature for the process lifetime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::hub::BroadcastHub;

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
    Renamed,
}

/// A change to one path under the watched workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChangeEvent {
    #[serde(rename = "event")]
    pub kind: FileChangeKind,
    /// Path relative to the watched root.
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl FileChangeEvent {
    fn new(kind: FileChangeKind, path: String) -> Self {
        Self {
            kind,
            path,
            timestamp: Utc::now(),
        }
    }
}

/// Watches a directory tree and fans change events out to a hub.
pub struct WorkspaceWatcher {
    root: PathBuf,
    max_depth: usize,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
}

impl WorkspaceWatcher {
    #[must_use]
    pub fn new(
        root: PathBuf,
        max_depth: usize,
        hub: Arc<BroadcastHub>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            root,
            max_depth,
            hub,
            cancel,
        }
    }

    /// Run the watcher on a background task until cancellation.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let mut watcher = match notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| {
                let _ = event_tx.send(result);
            },
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                tracing::warn!(error = %e, "workspace watcher unavailable, file events disabled");
                return;
            }
        };

        if let Err(e) = watcher.watch(&self.root, RecursiveMode::Recursive) {
            tracing::warn!(
                dir = %self.root.display(),
                error = %e,
                "cannot watch workspace, file events disabled"
            );
            return;
        }

        tracing::info!(dir = %self.root.display(), depth = self.max_depth, "watching workspace");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                received = event_rx.recv() => match received {
                    Some(Ok(event)) => self.forward(&event).await,
                    Some(Err(e)) => tracing::warn!(error = %e, "workspace watcher error"),
                    None => break,
                },
            }
        }

        drop(watcher);
        tracing::debug!("workspace watcher stopped");
    }

    async fn forward(&self, event: &notify::Event) {
        let Some(kind) = map_event_kind(&event.kind) else {
            return;
        };

        for path in &event.paths {
            let Some(relative) = relative_path(&self.root, path) else {
                continue;
            };
            if !within_depth(&relative, self.max_depth) {
                continue;
            }
            let change = FileChangeEvent::new(kind, relative.to_string_lossy().into_owned());
            self.hub.publish(&change).await;
        }
    }
}

fn map_event_kind(kind: &EventKind) -> Option<FileChangeKind> {
    match kind {
        EventKind::Create(_) => Some(FileChangeKind::Created),
        EventKind::Remove(_) => Some(FileChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileChangeKind::Renamed),
        EventKind::Modify(_) => Some(FileChangeKind::Modified),
        _ => None,
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Whether a relative path sits within the depth bound: a file directly
/// under the root is at depth zero.
fn within_depth(relative: &Path, max_depth: usize) -> bool {
    relative.components().count().saturating_sub(1) <= max_depth
}
