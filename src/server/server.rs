//! Dashboard HTTP server with axum router and graceful shutdown.

use axum::routing::{get, patch};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    create_task, delete_task, get_files, get_status, get_telemetry, list_tasks, update_task,
    ws_files, ws_logs,
};
use super::state::AppState;
use crate::config::ServerConfig;

/// Dashboard HTTP server.
///
/// Serves the REST API and the two WebSocket broadcast channels.
pub struct DashboardServer {
    config: ServerConfig,
    state: AppState,
}

impl DashboardServer {
    /// Create a server using the server section of the app config.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        let config = state.config.server.clone();
        Self { config, state }
    }

    /// Override the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    #[must_use]
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/telemetry", get(get_telemetry))
            .route("/api/status", get(get_status))
            .route("/api/files", get(get_files))
            .route("/api/tasks", get(list_tasks).post(create_task))
            .route("/api/tasks/:id", patch(update_task).delete(delete_task))
            .route("/ws/logs", get(ws_logs))
            .route("/ws/files", get(ws_files))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, binding to the configured address.
    ///
    /// The server runs until the state's cancellation token is triggered,
    /// at which point it performs a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.address();
        let cancel = self.state.cancel.clone();
        let app = self.build_router();

        tracing::info!(address = %address, "Starting dashboard server");

        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Dashboard server shutting down gracefully");
            })
            .await
            .map_err(ServerError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::hub::BroadcastHub;
    use crate::tasks::TaskStore;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    async fn test_state() -> (tempfile::TempDir, AppState) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.tasks.file = temp_dir.path().join("tasks.json");

        let tasks = TaskStore::open(&config.tasks.file).await.unwrap();
        let state = AppState::new(
            Arc::new(config),
            Arc::new(BroadcastHub::new("logs")),
            Arc::new(BroadcastHub::new("files")),
            Arc::new(tasks),
            CancellationToken::new(),
        );
        (temp_dir, state)
    }

    #[tokio::test]
    async fn test_server_default_address() {
        let (_temp_dir, state) = test_state().await;
        let server = DashboardServer::new(state);

        assert_eq!(server.address(), "127.0.0.1:3001");
    }

    #[tokio::test]
    async fn test_server_with_config() {
        let (_temp_dir, state) = test_state().await;
        let server = DashboardServer::new(state).with_config(ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_permissive: false,
        });

        assert_eq!(server.address(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_build_router() {
        let (_temp_dir, state) = test_state().await;
        let server = DashboardServer::new(state);

        // Just verify the router builds without panicking.
        let _router = server.build_router();
    }

    #[tokio::test]
    async fn test_build_router_without_cors() {
        let (_temp_dir, state) = test_state().await;
        let server = DashboardServer::new(state).with_config(ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            cors_permissive: false,
        });

        let _router = server.build_router();
    }
}
