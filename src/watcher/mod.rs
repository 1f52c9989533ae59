//! Session log watching, tailing and classification.
//!
//! The ingestion pipeline: discovery locates the active session log, the
//! tailer reads its forward growth, the classifier turns complete lines
//! into typed events, and the rotation monitor ties them together and
//! swaps the tailer when the active session changes. The workspace
//! watcher is the independent second pipeline feeding the `files`
//! channel.

mod classifier;
mod discovery;
mod error;
mod record;
mod rotation;
mod tailer;
mod workspace;

pub use classifier::{classify, classify_line, EventKind, LogEvent, MAX_MESSAGE_CHARS};
pub use discovery::{locate_latest_session, Session, SESSION_LOG_EXTENSION};
pub use error::WatcherError;
pub use record::{ContentBlock, MessageContent, RecordMessage, SessionRecord, UsageCounters};
pub use rotation::SessionRotationMonitor;
pub use tailer::LogTailer;
pub use workspace::{FileChangeEvent, FileChangeKind, WorkspaceWatcher};
