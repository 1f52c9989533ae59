//! Configuration types and loading.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{
    AppConfig, ProbeConfig, ServerConfig, SessionsConfig, TasksConfig, WorkspaceConfig,
    DEFAULT_PORT,
};
