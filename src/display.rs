//! Colored CLI display for streamed dashboard events.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::watcher::{EventKind, FileChangeEvent, FileChangeKind, LogEvent};

/// Maximum length for displayed messages.
const DEFAULT_MAX_LEN: usize = 160;

/// Truncate a string to a maximum number of characters, adding ellipsis
/// if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let cut: String = s.chars().take(max_len - 3).collect();
    format!("{cut}...")
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M:%S%.3f").to_string()
}

/// Print one log event.
pub fn print_log_event(event: &LogEvent) {
    let label = match event.kind {
        EventKind::Info => "[INFO]".blue().bold().to_string(),
        EventKind::Warning => "[WARN]".yellow().bold().to_string(),
        EventKind::Error => "[ERROR]".red().bold().to_string(),
        EventKind::Success => "[OK]".green().bold().to_string(),
    };

    println!(
        "{} {} {}",
        timestamp(&event.timestamp).dimmed(),
        label,
        truncate(&event.message, DEFAULT_MAX_LEN)
    );
}

/// Print one file change event.
pub fn print_file_change(event: &FileChangeEvent) {
    let label = match event.kind {
        FileChangeKind::Created => "[NEW]".green().bold().to_string(),
        FileChangeKind::Modified => "[MOD]".yellow().bold().to_string(),
        FileChangeKind::Deleted => "[DEL]".red().bold().to_string(),
        FileChangeKind::Renamed => "[REN]".cyan().bold().to_string(),
    };

    println!(
        "{} {} {}",
        timestamp(&event.timestamp).dimmed(),
        label,
        event.path
    );
}

/// Print a frame that did not parse as a known event.
pub fn print_raw(frame: &str) {
    println!("{}", truncate(frame, DEFAULT_MAX_LEN).dimmed());
}
