//! Logger handles: leveled logging calls bound to one pool entry

use super::{
    dispatch::{Dispatch, DispatchQueue},
    error::{PoolError, Result},
    log_level::LogLevel,
    log_metadata::LogMetadata,
    log_record::LogRecord,
    logger_config::LoggerConfig,
    logger_id::LoggerId,
    registry::LoggerRegistry,
};
use chrono::Utc;
use std::backtrace::Backtrace;
use std::sync::Arc;

/// Handle to one pooled logger
///
/// The handle stores the identity only. Every call re-resolves the pool
/// entry under the registry lock, so once the entry is removed or evicted
/// the handle reports [`PoolError::LoggerNotFound`] instead of writing to
/// stale state.
///
/// # Example
///
/// ```
/// use relay_logger_pool::prelude::*;
///
/// # fn main() -> relay_logger_pool::Result<()> {
/// let pool = LoggerPool::builder().transport(ConsoleTransport::new()).build()?;
/// let id = pool.create_logger("uploader", false, true, true);
/// let logger = pool.logger(id.as_str()).expect("just created");
///
/// assert_eq!(logger.debug("hidden")?, Dispatch::Filtered);
/// assert_eq!(logger.info("visible")?, Dispatch::Enqueued);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LoggerHandle {
    logger_id: LoggerId,
    registry: Arc<LoggerRegistry>,
    queue: DispatchQueue,
}

impl LoggerHandle {
    pub(crate) fn new(
        logger_id: LoggerId,
        registry: Arc<LoggerRegistry>,
        queue: DispatchQueue,
    ) -> Self {
        Self {
            logger_id,
            registry,
            queue,
        }
    }

    pub fn id(&self) -> &LoggerId {
        &self.logger_id
    }

    /// Gate-check, account and enqueue one message
    ///
    /// A disabled level returns [`Dispatch::Filtered`] without touching the
    /// entry's usage metadata.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        self.dispatch(level, message.into(), metadata, None)
    }

    fn dispatch(
        &self,
        level: LogLevel,
        message: String,
        metadata: Option<LogMetadata>,
        stack_trace: Option<String>,
    ) -> Result<Dispatch> {
        let now = Utc::now();
        let Some(service) = self
            .registry
            .record_usage(self.logger_id.as_str(), level, now)?
        else {
            return Ok(Dispatch::Filtered);
        };

        let mut record = LogRecord::new(level, message, service)
            .with_metadata(metadata)
            .with_timestamp(now);
        if let Some(trace) = stack_trace {
            record = record.with_stack_trace(trace);
        }

        Ok(self.queue.push(record))
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) -> Result<Dispatch> {
        self.log(LogLevel::Debug, message, None)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) -> Result<Dispatch> {
        self.log(LogLevel::Info, message, None)
    }

    #[inline]
    pub fn warning(&self, message: impl Into<String>) -> Result<Dispatch> {
        self.log(LogLevel::Warning, message, None)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) -> Result<Dispatch> {
        self.log(LogLevel::Error, message, None)
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) -> Result<Dispatch> {
        self.log(LogLevel::Critical, message, None)
    }

    pub fn debug_with(
        &self,
        message: impl Into<String>,
        metadata: LogMetadata,
    ) -> Result<Dispatch> {
        self.log(LogLevel::Debug, message, Some(metadata))
    }

    pub fn info_with(&self, message: impl Into<String>, metadata: LogMetadata) -> Result<Dispatch> {
        self.log(LogLevel::Info, message, Some(metadata))
    }

    pub fn warning_with(
        &self,
        message: impl Into<String>,
        metadata: LogMetadata,
    ) -> Result<Dispatch> {
        self.log(LogLevel::Warning, message, Some(metadata))
    }

    pub fn error_with(
        &self,
        message: impl Into<String>,
        metadata: LogMetadata,
    ) -> Result<Dispatch> {
        self.log(LogLevel::Error, message, Some(metadata))
    }

    pub fn critical_with(
        &self,
        message: impl Into<String>,
        metadata: LogMetadata,
    ) -> Result<Dispatch> {
        self.log(LogLevel::Critical, message, Some(metadata))
    }

    /// Error with the caller's backtrace attached as the stack trace
    pub fn error_with_trace(
        &self,
        message: impl Into<String>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        let trace = Backtrace::force_capture().to_string();
        self.dispatch(LogLevel::Error, message.into(), metadata, Some(trace))
    }

    /// Critical with the caller's backtrace attached as the stack trace
    pub fn critical_with_trace(
        &self,
        message: impl Into<String>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        let trace = Backtrace::force_capture().to_string();
        self.dispatch(LogLevel::Critical, message.into(), metadata, Some(trace))
    }

    /// Enable or disable one level; `Ok(false)` for error/critical, which
    /// cannot be changed
    pub fn set_level(&self, level: LogLevel, enabled: bool) -> Result<bool> {
        self.registry
            .set_level(self.logger_id.as_str(), level, enabled)
            .ok_or_else(|| PoolError::not_found(self.logger_id.as_str()))
    }

    pub fn config(&self) -> Result<LoggerConfig> {
        self.registry
            .config(self.logger_id.as_str())
            .ok_or_else(|| PoolError::not_found(self.logger_id.as_str()))
    }

    pub fn is_enabled(&self, level: LogLevel) -> Result<bool> {
        Ok(self.config()?.is_enabled(level))
    }

    /// Whether the pool entry still exists
    pub fn is_alive(&self) -> bool {
        self.registry.contains(self.logger_id.as_str())
    }
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("logger_id", &self.logger_id)
            .finish_non_exhaustive()
    }
}
