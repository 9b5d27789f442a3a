//! Serializable views of pool state

use super::{logger_config::LoggerConfig, logger_id::LoggerId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Copy of one pool entry at the time it was taken
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolEntrySnapshot {
    pub logger_id: LoggerId,
    pub service_name: String,
    pub config: LoggerConfig,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub age_seconds: f64,
    pub idle_seconds: f64,
    pub message_count: u64,
}

/// Aggregate pool and delivery statistics
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub total_services: usize,
    pub ttl_seconds: u64,
    pub ttl_cleanup_enabled: bool,
    pub messages_enqueued: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub queue_full_events: u64,
    pub queue_size: usize,
    pub loggers: Vec<PoolEntrySnapshot>,
}

impl PoolStats {
    /// Per-identity message counts
    pub fn message_counts(&self) -> impl Iterator<Item = (&LoggerId, u64)> {
        self.loggers
            .iter()
            .map(|entry| (&entry.logger_id, entry.message_count))
    }
}

/// Eviction switch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TtlStatus {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub pool_size: usize,
}

/// Service label alias and the configuration of the logger it points at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceBinding {
    pub logger_id: LoggerId,
    pub config: LoggerConfig,
}

pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 1000.0
}
