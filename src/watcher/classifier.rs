//! Event classification for session log records.
//!
//! Maps each parsed record to a typed event suitable for broadcast to
//! dashboard subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::SessionRecord;

/// Maximum length of an event message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// Severity of a broadcast event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Warning,
    Error,
    Success,
}

/// A typed, immutable event broadcast to log subscribers.
///
/// The timestamp is emission time, not log time. The identifier is opaque
/// and unique per event; receivers use it for keying and deduplication,
/// not for delivery guarantees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub id: Uuid,
}

impl LogEvent {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            id: Uuid::new_v4(),
        }
    }
}

/// Classify one complete log line.
///
/// Returns `None` for lines that do not parse as a record; unparseable
/// lines produce no event and are not surfaced to subscribers.
#[must_use]
pub fn classify_line(line: &str) -> Option<LogEvent> {
    let record = SessionRecord::parse(line)?;
    Some(classify(&record))
}

/// Map one parsed record to an event. First matching rule wins.
#[must_use]
pub fn classify(record: &SessionRecord) -> LogEvent {
    match record.record_type.as_deref() {
        Some("assistant") => {
            let message = record
                .leading_text()
                .filter(|text| !text.is_empty())
                .map_or_else(
                    || "assistant message".to_string(),
                    |text| truncate_chars(text, MAX_MESSAGE_CHARS),
                );
            LogEvent::new(EventKind::Info, message)
        }
        Some("tool_use") => {
            let name = record.name.as_deref().unwrap_or("unknown");
            LogEvent::new(EventKind::Warning, format!("Tool: {name}"))
        }
        Some("tool_result") => LogEvent::new(EventKind::Success, "Tool result received"),
        Some("error") => {
            let message = record
                .error
                .as_deref()
                .filter(|text| !text.is_empty())
                .unwrap_or("Error");
            LogEvent::new(EventKind::Error, message)
        }
        Some(other) => LogEvent::new(EventKind::Info, other),
        None => LogEvent::new(EventKind::Info, "event"),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_assistant_text() {
        let event = classify_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"working on it"}]}}"#,
        )
        .unwrap();

        assert_eq!(event.kind, EventKind::Info);
        assert_eq!(event.message, "working on it");
    }

    #[test]
    fn test_classify_assistant_without_text_falls_back() {
        let event = classify_line(r#"{"type":"assistant","message":{"content":[]}}"#).unwrap();

        assert_eq!(event.kind, EventKind::Info);
        assert_eq!(event.message, "assistant message");
    }

    #[test]
    fn test_classify_assistant_truncates_long_text() {
        let long = "x".repeat(500);
        let line = format!(
            r#"{{"type":"assistant","message":{{"content":[{{"type":"text","text":"{long}"}}]}}}}"#
        );
        let event = classify_line(&line).unwrap();

        assert_eq!(event.message.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_classify_truncation_respects_char_boundaries() {
        let long = "é".repeat(300);
        let line = format!(
            r#"{{"type":"assistant","message":{{"content":[{{"type":"text","text":"{long}"}}]}}}}"#
        );
        let event = classify_line(&line).unwrap();

        assert_eq!(event.message.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_classify_tool_use() {
        let event = classify_line(r#"{"type":"tool_use","name":"Bash"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Warning);
        assert_eq!(event.message, "Tool: Bash");
    }

    #[test]
    fn test_classify_tool_use_without_name() {
        let event = classify_line(r#"{"type":"tool_use"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Warning);
        assert_eq!(event.message, "Tool: unknown");
    }

    #[test]
    fn test_classify_tool_result() {
        let event = classify_line(r#"{"type":"tool_result"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Success);
        assert_eq!(event.message, "Tool result received");
    }

    #[test]
    fn test_classify_error() {
        let event = classify_line(r#"{"type":"error","error":"connection refused"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.message, "connection refused");
    }

    #[test]
    fn test_classify_error_without_text_falls_back() {
        let event = classify_line(r#"{"type":"error"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.message, "Error");
    }

    #[test]
    fn test_classify_unrecognized_type_uses_tag() {
        let event = classify_line(r#"{"type":"summary","summary":"done"}"#).unwrap();

        assert_eq!(event.kind, EventKind::Info);
        assert_eq!(event.message, "summary");
    }

    #[test]
    fn test_classify_untyped_record() {
        let event = classify_line(r#"{"data":42}"#).unwrap();

        assert_eq!(event.kind, EventKind::Info);
        assert_eq!(event.message, "event");
    }

    #[test]
    fn test_classify_malformed_line_yields_nothing() {
        assert!(classify_line("not json at all").is_none());
    }

    #[test]
    fn test_events_have_unique_ids() {
        let a = classify_line(r#"{"type":"tool_result"}"#).unwrap();
        let b = classify_line(r#"{"type":"tool_result"}"#).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_event_serializes_with_type_key() {
        let event = classify_line(r#"{"type":"tool_use","name":"Bash"}"#).unwrap();
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "warning");
        assert_eq!(json["message"], "Tool: Bash");
        assert!(json["timestamp"].is_string());
        assert!(json["id"].is_string());
    }
}
