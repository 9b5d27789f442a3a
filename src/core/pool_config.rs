//! Pool configuration
//!
//! Built explicitly and handed to [`LoggerPoolBuilder`](crate::LoggerPoolBuilder);
//! there is no process-wide configuration singleton.

use super::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings for the registry, the sender worker and the reaper
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```
/// use relay_logger_pool::PoolConfig;
///
/// let config: PoolConfig = serde_json::from_str(r#"{"ttl_seconds": 600}"#).unwrap();
/// assert_eq!(config.ttl_seconds, 600);
/// assert_eq!(config.queue_capacity, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Label of the logger created at startup and used by the direct-logging helpers
    pub default_service_name: String,
    /// Idle time after which a logger becomes eligible for eviction
    pub ttl_seconds: u64,
    /// Initial state of the eviction switch
    pub cleanup_enabled: bool,
    pub sweep_interval_secs: u64,
    pub queue_capacity: usize,
    /// How long the sender waits for a record before re-checking the stop flag
    pub poll_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_service_name: "file-server".to_string(),
            ttl_seconds: 3600,
            cleanup_enabled: true,
            sweep_interval_secs: 60,
            queue_capacity: 10_000,
            poll_timeout_ms: 1000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl PoolConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PoolError::io_operation(
                "reading pool configuration",
                path.display().to_string(),
                e,
            )
        })?;
        let config: PoolConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_service_name.trim().is_empty() {
            return Err(PoolError::config(
                "PoolConfig",
                "default_service_name must not be empty",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::config(
                "PoolConfig",
                "queue_capacity must be greater than zero",
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(PoolError::config(
                "PoolConfig",
                "sweep_interval_secs must be greater than zero",
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(PoolError::config(
                "PoolConfig",
                "poll_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Connection settings for the HTTP message relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Plain-HTTP endpoint of the relay, e.g. `http://127.0.0.1:8081`
    pub base_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_ms: 5000,
        }
    }
}

impl RelayConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PoolError::io_operation(
                "reading relay configuration",
                path.display().to_string(),
                e,
            )
        })?;
        let config: RelayConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(PoolError::config("RelayConfig", "bot_token is required"));
        }
        if self.chat_id.is_empty() {
            return Err(PoolError::config("RelayConfig", "chat_id is required"));
        }
        if self.timeout_ms == 0 {
            return Err(PoolError::config(
                "RelayConfig",
                "timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
