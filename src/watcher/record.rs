//! Serde model for session log records.
//!
//! Session logs are line-delimited JSON. Each line is one record; only the
//! fields the dashboard consumes are modeled here, everything else is
//! ignored by serde.

use serde::Deserialize;

/// A single record from a session log line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionRecord {
    /// The record's type tag (`assistant`, `tool_use`, ...).
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,
    /// Tool name, present on `tool_use` records.
    #[serde(default)]
    pub name: Option<String>,
    /// Error text, present on `error` records.
    #[serde(default)]
    pub error: Option<String>,
    /// Nested message body.
    #[serde(default)]
    pub message: Option<RecordMessage>,
    /// Usage counters at the record's top level.
    #[serde(default)]
    pub usage: Option<UsageCounters>,
}

/// Message body nested inside a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Usage counters nested inside the message.
    #[serde(default)]
    pub usage: Option<UsageCounters>,
}

/// Message content - can be plain text or structured blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A content block within a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use request
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool result
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
    },
    /// Thinking block
    Thinking { thinking: String },
    /// Unknown block type
    #[serde(other)]
    Unknown,
}

/// Token usage counters found on usage-bearing records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl SessionRecord {
    /// Parse one complete log line.
    ///
    /// Returns `None` for lines that are not well-formed records; a bad
    /// line never aborts processing of subsequent lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match serde_json::from_str(line.trim()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed log line");
                None
            }
        }
    }

    /// Leading text of the message content, if any.
    #[must_use]
    pub fn leading_text(&self) -> Option<&str> {
        match self.message.as_ref()?.content.as_ref()? {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => match blocks.first()? {
                ContentBlock::Text { text } => Some(text),
                _ => None,
            },
        }
    }
}
