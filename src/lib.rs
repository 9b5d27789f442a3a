//! # Relay Logger Pool
//!
//! A pool of named loggers that relay their records to a chat-bot message
//! relay, with idle loggers evicted after a time-to-live.
//!
//! ## Features
//!
//! - **Per-logger gates**: debug, info and warning switch independently;
//!   error and critical are always on
//! - **Asynchronous delivery**: a bounded queue drained by one sender thread
//! - **TTL eviction**: a reaper thread removes loggers left idle too long
//! - **Service labels**: `service_logger("name")` reuses one logger per label
//!
//! ## Example
//!
//! ```
//! use relay_logger_pool::prelude::*;
//!
//! # fn main() -> relay_logger_pool::Result<()> {
//! let pool = LoggerPool::builder()
//!     .transport(ConsoleTransport::new())
//!     .build()?;
//!
//! let id = pool.create_logger("uploader", false, true, true);
//! let logger = pool.logger(id.as_str()).expect("just created");
//! logger.info_with(
//!     "File uploaded",
//!     LogMetadata::new().with_field("file_id", "a1b2").with_field("size", 2048),
//! )?;
//!
//! println!("{}", serde_json::to_string_pretty(&pool.stats())?);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod macros;
pub mod transports;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::transports::ConsoleTransport;
    pub use crate::core::{
        Dispatch, LevelUpdate, LogLevel, LogMetadata, LogRecord, LoggerConfig, LoggerHandle,
        LoggerId, LoggerPool, LoggerPoolBuilder, OverflowPolicy, PoolConfig, PoolError, Result,
        Transport, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

#[cfg(feature = "console")]
pub use transports::ConsoleTransport;
#[cfg(feature = "relay")]
pub use transports::RelayTransport;
pub use core::{
    Dispatch, DispatchMetrics, LevelUpdate, LogLevel, LogMetadata, LogRecord, LoggerConfig,
    LoggerHandle, LoggerId, LoggerPool, LoggerPoolBuilder, LoggerRegistry, OverflowPolicy,
    PoolConfig, PoolEntrySnapshot, PoolError, PoolStats, RelayConfig, Result, ServiceBinding,
    Transport, TtlPolicy, TtlStatus, DEFAULT_SHUTDOWN_TIMEOUT,
};
