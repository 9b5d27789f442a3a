//! Console transport implementation

use crate::core::{LogLevel, LogRecord, Result, Transport};
use colored::Colorize;

/// Prints one line per record; error and critical go to stderr
pub struct ConsoleTransport {
    use_colors: bool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn format_line(&self, record: &LogRecord) -> String {
        let level_str = if self.use_colors {
            format!("{:8}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:8}", record.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}] {} - {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level_str,
            record.service,
            record.message
        );

        if let Some(ref metadata) = record.metadata {
            line.push(' ');
            line.push_str(&metadata.format_fields());
        }
        if let Some(ref trace) = record.stack_trace {
            line.push('\n');
            line.push_str(trace);
        }

        line
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn deliver(&mut self, record: &LogRecord) -> Result<()> {
        let line = self.format_line(record);

        match record.level {
            LogLevel::Error | LogLevel::Critical => eprintln!("{}", line),
            _ => println!("{}", line),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogMetadata;

    #[test]
    fn test_plain_line() {
        let transport = ConsoleTransport::with_colors(false);
        let record = LogRecord::new(LogLevel::Warning, "disk almost full", "file-server")
            .with_metadata(Some(LogMetadata::new().with_field("free_mb", 12)));

        let line = transport.format_line(&record);
        assert!(line.contains("[WARNING ]"));
        assert!(line.contains("file-server - disk almost full"));
        assert!(line.ends_with("free_mb=12"));
    }

    #[test]
    fn test_stack_trace_on_following_lines() {
        let transport = ConsoleTransport::with_colors(false);
        let record = LogRecord::new(LogLevel::Error, "boom", "svc").with_stack_trace("at main");

        let line = transport.format_line(&record);
        assert_eq!(line.lines().last(), Some("at main"));
    }

    #[test]
    fn test_deliver_and_probe() {
        let mut transport = ConsoleTransport::new();
        let record = LogRecord::new(LogLevel::Info, "hello", "svc");
        assert!(transport.deliver(&record).is_ok());
        assert_eq!(transport.probe().unwrap(), "console");
    }
}
