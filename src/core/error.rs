//! Error types for the logger pool

pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Unknown or already evicted logger identity
    #[error("Logger not found: {logger_id}")]
    LoggerNotFound { logger_id: String },

    /// Unsupported level name
    #[error("Invalid log level: '{level}'")]
    InvalidLevel { level: String },

    /// Background worker could not be started
    #[error("Failed to spawn {worker} worker: {source}")]
    WorkerSpawn {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level delivery failure
    #[error("Transport '{transport}' failed: {message}")]
    Transport { transport: String, message: String },

    /// Relay answered with a non-success status
    #[error("Relay responded with status {status}: {body}")]
    TransportStatus { status: u16, body: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PoolError {
    pub fn not_found(logger_id: impl Into<String>) -> Self {
        PoolError::LoggerNotFound {
            logger_id: logger_id.into(),
        }
    }

    pub fn invalid_level(level: impl Into<String>) -> Self {
        PoolError::InvalidLevel {
            level: level.into(),
        }
    }

    pub fn worker_spawn(worker: impl Into<String>, source: std::io::Error) -> Self {
        PoolError::WorkerSpawn {
            worker: worker.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }

    pub fn transport_status(status: u16, body: impl Into<String>) -> Self {
        PoolError::TransportStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Whether the error means the identity is unknown to the pool
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::LoggerNotFound { .. })
    }
}
