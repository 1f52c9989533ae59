//! JSON-file backed task store.
//!
//! A small persisted collection of task records with sequential
//! identifiers, consumed by the dashboard's CRUD endpoints.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Errors that can occur in the task store.
#[derive(thiserror::Error, Debug)]
pub enum TaskStoreError {
    #[error("Failed to read task file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write task file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// One task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Sequentially assigned identifier (`TSK-001`, ...).
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion percentage, 0..=100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default = "default_column")]
    pub status: String,
    #[serde(default = "default_column")]
    pub column: String,
    #[serde(default = "default_agent")]
    pub agent: String,
}

fn default_column() -> String {
    "backlog".to_string()
}

fn default_agent() -> String {
    "Claude".to_string()
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
}

/// Partial update applied to an existing task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub progress: Option<u8>,
    pub status: Option<String>,
    pub column: Option<String>,
    pub agent: Option<String>,
}

/// Task collection persisted as a JSON array file.
pub struct TaskStore {
    path: PathBuf,
    tasks: Mutex<Vec<TaskRecord>>,
}

impl TaskStore {
    /// Open a store, loading existing tasks from disk.
    ///
    /// A missing file is an empty store; it is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TaskStoreError> {
        let path = path.into();
        let tasks = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|source| TaskStoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(TaskStoreError::Read { path, source }),
        };

        Ok(Self {
            path,
            tasks: Mutex::new(tasks),
        })
    }

    /// All tasks, in insertion order.
    pub async fn list(&self) -> Vec<TaskRecord> {
        self.tasks.lock().await.clone()
    }

    /// Create a task with the next sequential identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    pub async fn create(&self, new: NewTask) -> Result<TaskRecord, TaskStoreError> {
        let mut tasks = self.tasks.lock().await;

        let record = TaskRecord {
            id: next_task_id(&tasks),
            title: new.title,
            description: new.description,
            progress: 0,
            status: default_column(),
            column: default_column(),
            agent: new.agent.unwrap_or_else(default_agent),
        };

        tasks.push(record.clone());
        self.persist(&tasks).await?;
        Ok(record)
    }

    /// Apply a partial update to a task.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a persistence error.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<TaskRecord, TaskStoreError> {
        let mut tasks = self.tasks.lock().await;

        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Err(TaskStoreError::NotFound(id.to_string()));
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(progress) = patch.progress {
            task.progress = progress.min(100);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(column) = patch.column {
            task.column = column;
        }
        if let Some(agent) = patch.agent {
            task.agent = agent;
        }

        let updated = task.clone();
        self.persist(&tasks).await?;
        Ok(updated)
    }

    /// Remove a task. Returns whether a task was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    pub async fn remove(&self, id: &str) -> Result<bool, TaskStoreError> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        let removed = tasks.len() != before;

        if removed {
            self.persist(&tasks).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, tasks: &[TaskRecord]) -> Result<(), TaskStoreError> {
        let json = serde_json::to_string_pretty(tasks).map_err(TaskStoreError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| TaskStoreError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| TaskStoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Next sequential id. Survives deletions: the highest existing number
/// is never reused.
fn next_task_id(tasks: &[TaskRecord]) -> String {
    let next = tasks
        .iter()
        .filter_map(|task| task.id.strip_prefix("TSK-")?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    format!("TSK-{next:03}")
}
