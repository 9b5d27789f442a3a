//! Transport trait for log delivery destinations

use super::{error::Result, log_record::LogRecord};

/// Destination the sender worker relays records to
///
/// Implementations are driven from the single sender thread, one record per
/// call. Errors are counted by the worker and never reach the logging caller.
pub trait Transport: Send + Sync {
    fn deliver(&mut self, record: &LogRecord) -> Result<()>;

    /// Check that the destination is reachable, returning an identity string
    fn probe(&mut self) -> Result<String> {
        Ok(self.name().to_string())
    }

    fn name(&self) -> &str;
}
