//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port for the dashboard server.
pub const DEFAULT_PORT: u16 = 3001;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub workspace: WorkspaceConfig,
    pub tasks: TasksConfig,
    pub probe: ProbeConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors_permissive: true,
        }
    }
}

/// Session log ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Directory holding the agent's session logs.
    pub dir: PathBuf,
    /// How often to re-check which session is active, in seconds.
    pub rotation_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            dir: default_sessions_dir(),
            rotation_interval_secs: 30,
        }
    }
}

fn default_sessions_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openclaw")
        .join("agents")
        .join("main")
        .join("sessions")
}

/// Workspace watching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root of the workspace tree to watch.
    pub dir: PathBuf,
    /// Maximum directory depth below the root to report events for.
    pub max_depth: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            max_depth: 3,
        }
    }
}

/// Task store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Path of the JSON task file.
    pub file: PathBuf,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("data").join("tasks.json"),
        }
    }
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Pattern matched against running processes (`pgrep -f`).
    pub process_pattern: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            process_pattern: "openclaw".to_string(),
        }
    }
}
