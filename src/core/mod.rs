//! Core pool types and traits

pub mod dispatch;
pub mod error;
pub mod handle;
pub mod log_level;
pub mod log_metadata;
pub mod log_record;
pub mod logger_config;
pub mod logger_id;
pub mod metrics;
pub mod overflow_policy;
pub mod pool;
pub mod pool_config;
pub mod reaper;
pub mod registry;
pub mod snapshot;
pub mod transport;
mod worker;

pub use dispatch::{
    Dispatch, DispatchQueue, SenderWorker, SharedTransport, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use error::{PoolError, Result};
pub use handle::LoggerHandle;
pub use log_level::LogLevel;
pub use log_metadata::LogMetadata;
pub use log_record::{LogRecord, MAX_STACK_TRACE_CHARS};
pub use logger_config::{LevelUpdate, LoggerConfig};
pub use logger_id::LoggerId;
pub use metrics::DispatchMetrics;
pub use overflow_policy::OverflowPolicy;
pub use pool::{LoggerPool, LoggerPoolBuilder};
pub use pool_config::{PoolConfig, RelayConfig};
pub use reaper::{sweep, Reaper, TtlPolicy};
pub use registry::LoggerRegistry;
pub use snapshot::{PoolEntrySnapshot, PoolStats, ServiceBinding, TtlStatus};
pub use transport::Transport;
