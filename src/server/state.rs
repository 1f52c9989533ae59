//! Shared server state.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::hub::BroadcastHub;
use crate::tasks::TaskStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Hub for the `logs` channel.
    pub log_hub: Arc<BroadcastHub>,
    /// Hub for the `files` channel.
    pub file_hub: Arc<BroadcastHub>,
    pub tasks: Arc<TaskStore>,
    /// Server start time, for uptime reporting.
    pub started_at: Instant,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

impl AppState {
    /// Create new app state. Uptime counts from this call.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        log_hub: Arc<BroadcastHub>,
        file_hub: Arc<BroadcastHub>,
        tasks: Arc<TaskStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            log_hub,
            file_hub,
            tasks,
            started_at: Instant::now(),
            cancel,
        }
    }

    /// Seconds since the server started.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_state(temp_dir: &std::path::Path) -> AppState {
        let mut config = AppConfig::default();
        config.sessions.dir = temp_dir.join("sessions");
        config.workspace.dir = temp_dir.join("workspace");
        config.tasks.file = temp_dir.join("tasks.json");

        let tasks = TaskStore::open(&config.tasks.file).await.unwrap();

        AppState::new(
            Arc::new(config),
            Arc::new(BroadcastHub::new("logs")),
            Arc::new(BroadcastHub::new("files")),
            Arc::new(tasks),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_state_uptime_starts_near_zero() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path()).await;
        assert!(state.uptime_secs() < 5);
    }

    #[tokio::test]
    async fn test_state_is_cheaply_cloneable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = test_state(temp_dir.path()).await;
        let clone = state.clone();
        assert_eq!(clone.config.server.port, state.config.server.port);
    }
}
