//! Session rotation monitoring.
//!
//! Owns the current [`LogTailer`] and drives the tail-classify-publish
//! pipeline: debounced filesystem signals trigger delta reads, and a fixed
//! interval re-runs discovery to swap-and-retire the tailer when the
//! active session identity changes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::RecursiveMode,
    DebounceEventResult,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::classifier;
use super::discovery;
use super::tailer::LogTailer;
use crate::hub::BroadcastHub;

/// Debounce window for session log change notifications.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Watches the sessions directory and streams the active session's growth
/// into a broadcast hub.
///
/// Exactly one tailer is live at any time; rotation retires the old one
/// before starting its replacement, and the replacement's cursor starts at
/// the new file's then-current size (backlog is never replayed through the
/// live channel).
pub struct SessionRotationMonitor {
    sessions_dir: PathBuf,
    interval: Duration,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
}

impl SessionRotationMonitor {
    #[must_use]
    pub fn new(
        sessions_dir: PathBuf,
        interval: Duration,
        hub: Arc<BroadcastHub>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sessions_dir,
            interval,
            hub,
            cancel,
        }
    }

    /// Run the monitor on a background task until cancellation.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<PathBuf>();
        let callback_tx = signal_tx.clone();

        let mut debouncer = match new_debouncer(
            DEBOUNCE_WINDOW,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in &events {
                        for path in &event.paths {
                            let _ = callback_tx.send(path.clone());
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(error = %error, "session watch error");
                    }
                }
            },
        ) {
            Ok(debouncer) => Some(debouncer),
            Err(e) => {
                tracing::error!(error = %e, "cannot create session log watcher, polling only");
                None
            }
        };

        let mut watching = false;
        let mut tailer: Option<LogTailer> = None;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !watching {
                        if let Some(debouncer) = debouncer.as_mut() {
                            match debouncer.watch(&self.sessions_dir, RecursiveMode::NonRecursive) {
                                Ok(()) => {
                                    watching = true;
                                    tracing::debug!(dir = %self.sessions_dir.display(), "watching sessions directory");
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "sessions directory not watchable yet");
                                }
                            }
                        }
                    }
                    self.rotate_if_needed(&mut tailer).await;
                    if let Some(current) = tailer.as_mut() {
                        self.drain(current).await;
                    }
                }
                signal = signal_rx.recv() => {
                    let Some(path) = signal else { break };
                    if let Some(current) = tailer.as_mut() {
                        if path == current.path() {
                            self.drain(current).await;
                        }
                    }
                }
            }
        }

        if let Some(current) = tailer.as_mut() {
            current.retire();
        }
        drop(debouncer);
        tracing::debug!("session rotation monitor stopped");
    }

    /// Re-run discovery and swap-and-retire the tailer on identity change.
    async fn rotate_if_needed(&self, tailer: &mut Option<LogTailer>) {
        let located = discovery::locate_latest_session(&self.sessions_dir);
        let current_path = tailer.as_ref().map(|t| t.path().to_path_buf());

        match located {
            Some(session) => {
                if current_path.as_deref() == Some(session.path.as_path()) {
                    return;
                }
                if let Some(old) = tailer.as_mut() {
                    old.retire();
                    tracing::info!(
                        from = %old.path().display(),
                        to = %session.path.display(),
                        "session rotated"
                    );
                }
                *tailer = Some(LogTailer::start(session).await);
            }
            None => {
                if let Some(old) = tailer.as_mut() {
                    old.retire();
                    tracing::info!(path = %old.path().display(), "active session gone, idling");
                }
                *tailer = None;
            }
        }
    }

    /// Read the tailer's delta, classify each complete line and publish.
    async fn drain(&self, tailer: &mut LogTailer) {
        match tailer.poll_changes().await {
            Ok(lines) => {
                for line in lines {
                    if let Some(event) = classifier::classify_line(&line) {
                        self.hub.publish(&event).await;
                    }
                }
            }
            Err(e) => {
                tracing::debug!(
                    path = %tailer.path().display(),
                    error = %e,
                    "delta read failed, retrying on next signal"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn monitor_for(dir: &std::path::Path) -> (SessionRotationMonitor, Arc<BroadcastHub>) {
        let hub = Arc::new(BroadcastHub::new("logs"));
        let monitor = SessionRotationMonitor::new(
            dir.to_path_buf(),
            Duration::from_secs(30),
            hub.clone(),
            CancellationToken::new(),
        );
        (monitor, hub)
    }

    fn append(path: &std::path::Path, content: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        write!(file, "{content}").unwrap();
    }

    #[tokio::test]
    async fn test_rotation_starts_tailer_when_session_appears() {
        let temp_dir = TempDir::new().unwrap();
        let (monitor, _hub) = monitor_for(temp_dir.path());
        let mut tailer = None;

        monitor.rotate_if_needed(&mut tailer).await;
        assert!(tailer.is_none());

        append(&temp_dir.path().join("session.jsonl"), "{}\n");
        monitor.rotate_if_needed(&mut tailer).await;
        assert!(tailer.is_some());
    }

    #[tokio::test]
    async fn test_rotation_keeps_tailer_for_same_identity() {
        let temp_dir = TempDir::new().unwrap();
        append(&temp_dir.path().join("session.jsonl"), "{}\n");

        let (monitor, _hub) = monitor_for(temp_dir.path());
        let mut tailer = None;
        monitor.rotate_if_needed(&mut tailer).await;
        let offset = tailer.as_ref().unwrap().offset();

        monitor.rotate_if_needed(&mut tailer).await;
        assert_eq!(tailer.as_ref().unwrap().offset(), offset);
        assert!(!tailer.as_ref().unwrap().is_retired());
    }

    #[tokio::test]
    async fn test_rotation_isolates_offsets() {
        let temp_dir = TempDir::new().unwrap();
        let old_path = temp_dir.path().join("old.jsonl");
        append(&old_path, "{}\n{}\n{}\n");

        let (monitor, _hub) = monitor_for(temp_dir.path());
        let mut tailer = None;
        monitor.rotate_if_needed(&mut tailer).await;
        let old_offset = tailer.as_ref().unwrap().offset();
        assert_eq!(old_offset, 9);

        std::thread::sleep(Duration::from_millis(10));
        let new_path = temp_dir.path().join("rotated.jsonl");
        append(&new_path, "{}\n");

        monitor.rotate_if_needed(&mut tailer).await;
        let current = tailer.as_ref().unwrap();
        assert_eq!(current.path(), new_path);

        // The fresh tailer's cursor is the new file's size at rotation
        // time, independent of the retired tailer's final offset.
        assert_eq!(current.offset(), 3);
    }

    #[tokio::test]
    async fn test_rotation_retires_when_sessions_vanish() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.jsonl");
        append(&path, "{}\n");

        let (monitor, _hub) = monitor_for(temp_dir.path());
        let mut tailer = None;
        monitor.rotate_if_needed(&mut tailer).await;
        assert!(tailer.is_some());

        std::fs::remove_file(&path).unwrap();
        monitor.rotate_if_needed(&mut tailer).await;
        assert!(tailer.is_none());
    }

    #[tokio::test]
    async fn test_drain_publishes_classified_events() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.jsonl");
        append(&path, "");

        let (monitor, hub) = monitor_for(temp_dir.path());
        let mut tailer = None;
        monitor.rotate_if_needed(&mut tailer).await;
        let tailer = tailer.as_mut().unwrap();

        let mut subscription = hub.subscribe().await;
        append(&path, "{\"type\":\"tool_use\",\"name\":\"Bash\"}\nnot json\n{\"type\":\"tool_result\"}\n");
        monitor.drain(tailer).await;

        let first = subscription.receiver.recv().await.unwrap();
        assert!(first.contains("Tool: Bash"));
        // The malformed line is skipped, not broadcast.
        let second = subscription.receiver.recv().await.unwrap();
        assert!(second.contains("Tool result received"));
        assert!(subscription.receiver.try_recv().is_err());
    }
}
