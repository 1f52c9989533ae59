//! Watcher error types.

/// Errors that can occur while watching and tailing session logs.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
