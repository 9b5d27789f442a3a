//! Logging macros for format-string messages on a [`LoggerHandle`].
//!
//! Each macro expands to a `LoggerHandle::log` call and returns its
//! `Result<Dispatch>`.
//!
//! # Examples
//!
//! ```
//! use relay_logger_pool::prelude::*;
//! use relay_logger_pool::{info, warning};
//!
//! # fn main() -> relay_logger_pool::Result<()> {
//! let pool = LoggerPool::builder().transport(ConsoleTransport::new()).build()?;
//! let logger = pool.service_logger("uploader");
//!
//! let file_id = "a1b2";
//! info!(logger, "File uploaded: {}", file_id)?;
//! warning!(logger, "Upload took {} ms", 1520)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`LoggerHandle`]: crate::LoggerHandle

/// Log a formatted message at the given level.
///
/// # Examples
///
/// ```
/// # use relay_logger_pool::prelude::*;
/// # fn main() -> relay_logger_pool::Result<()> {
/// # let pool = LoggerPool::builder().transport(ConsoleTransport::new()).build()?;
/// # let logger = pool.default_logger();
/// use relay_logger_pool::log;
/// log!(logger, LogLevel::Info, "Simple message")?;
/// log!(logger, LogLevel::Error, "Error code: {}", 500)?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), None)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Dispatch, LogLevel, LoggerPool, Result, Transport, LogRecord};

    struct NullTransport;

    impl Transport for NullTransport {
        fn deliver(&mut self, _record: &LogRecord) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_macros_respect_gates() {
        let pool = LoggerPool::builder().transport(NullTransport).build().unwrap();
        let id = pool.create_logger("macros", false, true, true);
        let logger = pool.logger(id.as_str()).unwrap();

        assert_eq!(debug!(logger, "value {}", 1).unwrap(), Dispatch::Filtered);
        assert_eq!(info!(logger, "value {}", 2).unwrap(), Dispatch::Enqueued);
        assert_eq!(warning!(logger, "value {}", 3).unwrap(), Dispatch::Enqueued);
        assert_eq!(error!(logger, "value {}", 4).unwrap(), Dispatch::Enqueued);
        assert_eq!(critical!(logger, "value {}", 5).unwrap(), Dispatch::Enqueued);
        assert_eq!(
            log!(logger, LogLevel::Info, "plain").unwrap(),
            Dispatch::Enqueued
        );

        assert_eq!(pool.logger_info(id.as_str()).unwrap().message_count, 5);
    }
}
