//! Log record structure

use super::log_level::LogLevel;
use super::log_metadata::LogMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stack trace characters forwarded to the relay
pub const MAX_STACK_TRACE_CHARS: usize = 1000;

/// A single log message waiting in the dispatch queue
///
/// `timestamp` is the capture time, not the send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LogMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            service: service.into(),
            metadata: None,
            stack_trace: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach metadata; empty maps are dropped
    pub fn with_metadata(mut self, metadata: Option<LogMetadata>) -> Self {
        self.metadata = metadata.filter(|m| !m.is_empty());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Render the record as a Markdown chat message
    ///
    /// Header line with level emoji, level and service, then the message,
    /// then optional fenced blocks for metadata (pretty JSON) and the stack
    /// trace, then the capture time as `%Y-%m-%d %H:%M:%S`.
    pub fn render_markdown(&self) -> String {
        let mut lines = vec![
            format!(
                "{} *{}* - {}",
                self.level.emoji(),
                self.level.to_str(),
                self.service
            ),
            format!("📌 {}", self.message),
        ];

        if let Some(ref metadata) = self.metadata {
            let rendered = metadata
                .to_json_pretty()
                .unwrap_or_else(|_| metadata.format_fields());
            lines.push(format!("📊 ```json\n{}\n```", rendered));
        }

        if let Some(ref trace) = self.stack_trace {
            let truncated: String = trace.chars().take(MAX_STACK_TRACE_CHARS).collect();
            lines.push(format!("🔍 ```\n{}\n```", truncated));
        }

        lines.push(format!("🕐 {}", self.timestamp.format("%Y-%m-%d %H:%M:%S")));
        lines.join("\n")
    }
}
