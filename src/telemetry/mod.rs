//! Session telemetry aggregation.
//!
//! Scans a full session log and derives cumulative usage, cost and
//! context-window metrics. The scan is a pure function of file contents:
//! no incremental state, recomputed on demand.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::watcher::SessionRecord;

/// Price per million input tokens, in dollars (Opus tier).
pub const PRICE_INPUT_PER_MTOK: f64 = 3.0;

/// Price per million output tokens, in dollars (Opus tier).
pub const PRICE_OUTPUT_PER_MTOK: f64 = 15.0;

/// Context window size used for utilization, in tokens.
pub const CONTEXT_WINDOW_TOKENS: u64 = 200_000;

/// Derived usage metrics for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    /// Cumulative input tokens across the session.
    pub input_tokens: u64,
    /// Cumulative output tokens across the session.
    pub output_tokens: u64,
    /// Estimated session cost in dollars, rounded to 4 decimal places.
    pub session_cost: f64,
    /// Context window utilization percentage, clamped to 0..=100.
    pub context_usage: u8,
    /// Server process uptime in seconds.
    pub uptime_secs: u64,
}

impl TelemetrySnapshot {
    /// Build a snapshot from raw token totals.
    #[must_use]
    pub fn from_totals(input_tokens: u64, output_tokens: u64) -> Self {
        // Per-token prices are whole micro-dollars; the sum stays exact in f64.
        #[allow(clippy::cast_precision_loss)]
        let micro_dollars =
            input_tokens as f64 * PRICE_INPUT_PER_MTOK + output_tokens as f64 * PRICE_OUTPUT_PER_MTOK;
        let session_cost = (micro_dollars / 100.0).round() / 10_000.0;

        #[allow(clippy::cast_precision_loss)]
        let utilization = (input_tokens as f64 * 100.0 / CONTEXT_WINDOW_TOKENS as f64).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let context_usage = utilization.min(100.0) as u8;

        Self {
            input_tokens,
            output_tokens,
            session_cost,
            context_usage,
            uptime_secs: 0,
        }
    }

    /// Attach the server's uptime.
    #[must_use]
    pub fn with_uptime(mut self, uptime_secs: u64) -> Self {
        self.uptime_secs = uptime_secs;
        self
    }
}

/// Scan a session log in full and aggregate its usage counters.
///
/// Usage is read from both locations a record may carry it: the top-level
/// `usage` field and the nested `message.usage` field. Malformed lines
/// are tolerated per line; an unreadable file yields an empty snapshot.
/// Scanning an unchanged file twice yields identical results.
pub async fn scan_session(path: &Path) -> TelemetrySnapshot {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "session not readable for telemetry");
            return TelemetrySnapshot::default();
        }
    };

    aggregate(&content)
}

/// Aggregate usage counters from session log content.
#[must_use]
pub fn aggregate(content: &str) -> TelemetrySnapshot {
    let mut input_tokens = 0u64;
    let mut output_tokens = 0u64;

    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        let Some(record) = SessionRecord::parse(line) else {
            continue;
        };
        if let Some(usage) = &record.usage {
            input_tokens += usage.input_tokens;
            output_tokens += usage.output_tokens;
        }
        if let Some(usage) = record.message.as_ref().and_then(|m| m.usage.as_ref()) {
            input_tokens += usage.input_tokens;
            output_tokens += usage.output_tokens;
        }
    }

    TelemetrySnapshot::from_totals(input_tokens, output_tokens)
}
