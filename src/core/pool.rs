//! Logger pool: registry, dispatch worker and reaper behind one facade

use super::{
    dispatch::{Dispatch, DispatchQueue, SenderWorker, SharedTransport},
    error::Result,
    handle::LoggerHandle,
    log_level::LogLevel,
    log_metadata::LogMetadata,
    logger_config::{LevelUpdate, LoggerConfig},
    logger_id::LoggerId,
    metrics::DispatchMetrics,
    overflow_policy::OverflowPolicy,
    pool_config::PoolConfig,
    reaper::{self, Reaper, TtlPolicy},
    registry::LoggerRegistry,
    snapshot::{PoolEntrySnapshot, PoolStats, ServiceBinding, TtlStatus},
    transport::Transport,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Pool of named loggers sharing one sender and one reaper
///
/// Owns the registry, the dispatch queue with its sender thread, and the
/// reaper thread. Dropping the pool stops both threads; records still queued
/// at that point are not delivered.
///
/// # Example
///
/// ```
/// use relay_logger_pool::prelude::*;
///
/// # fn main() -> relay_logger_pool::Result<()> {
/// let pool = LoggerPool::builder()
///     .transport(ConsoleTransport::new())
///     .default_service_name("gateway")
///     .build()?;
///
/// let id = pool.create_logger("uploader", true, true, true);
/// pool.log(id.as_str(), LogLevel::Debug, "chunk received", None)?;
///
/// pool.default_logger().info("gateway up")?;
/// assert_eq!(pool.stats().pool_size, 2);
/// # Ok(())
/// # }
/// ```
pub struct LoggerPool {
    registry: Arc<LoggerRegistry>,
    ttl_policy: Arc<TtlPolicy>,
    queue: DispatchQueue,
    sender: SenderWorker,
    reaper: Reaper,
    transport: SharedTransport,
    default_service_name: String,
    shutdown_timeout: Duration,
}

impl LoggerPool {
    /// Pool with default configuration and the default transport
    pub fn new() -> Result<Self> {
        LoggerPoolBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> LoggerPoolBuilder {
        LoggerPoolBuilder::new()
    }

    fn handle(&self, logger_id: LoggerId) -> LoggerHandle {
        LoggerHandle::new(logger_id, Arc::clone(&self.registry), self.queue.clone())
    }

    /// Create a logger with explicit gates; error and critical are always on
    pub fn create_logger(
        &self,
        service_name: impl Into<String>,
        debug: bool,
        warning: bool,
        info: bool,
    ) -> LoggerId {
        self.registry
            .create(LoggerConfig::with_levels(service_name, debug, warning, info))
    }

    /// Handle for an existing logger; acquiring it counts as use
    pub fn logger(&self, logger_id: &str) -> Option<LoggerHandle> {
        if !self.registry.touch(logger_id) {
            return None;
        }
        Some(self.handle(LoggerId::from(logger_id)))
    }

    /// Snapshot of one entry without refreshing its idle time
    pub fn logger_info(&self, logger_id: &str) -> Option<PoolEntrySnapshot> {
        self.registry.snapshot(logger_id)
    }

    pub fn config(&self, logger_id: &str) -> Option<LoggerConfig> {
        self.registry.config(logger_id)
    }

    pub fn update_config(&self, logger_id: &str, update: &LevelUpdate) -> Option<LoggerConfig> {
        self.registry.update_config(logger_id, update)
    }

    /// Log through the logger with the given identity
    pub fn log(
        &self,
        logger_id: &str,
        level: LogLevel,
        message: impl Into<String>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        self.handle(LoggerId::from(logger_id))
            .log(level, message, metadata)
    }

    /// Like [`LoggerPool::log`] with the level given by name
    ///
    /// An unknown level name fails before anything is recorded.
    pub fn log_str(
        &self,
        logger_id: &str,
        level: &str,
        message: impl Into<String>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        let level: LogLevel = level.parse()?;
        self.log(logger_id, level, message, metadata)
    }

    /// Info-level probe message tagged `{"test": true}`
    pub fn send_test_message(&self, logger_id: &str) -> Result<Dispatch> {
        let message = format!(
            "Test message from API at {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );
        let metadata = LogMetadata::new().with_field("test", true);
        self.log(logger_id, LogLevel::Info, message, Some(metadata))
    }

    pub fn list_all(&self) -> Vec<PoolEntrySnapshot> {
        self.registry.list()
    }

    pub fn stats(&self) -> PoolStats {
        let metrics = self.queue.metrics();
        PoolStats {
            pool_size: self.registry.len(),
            total_services: self.registry.service_count(),
            ttl_seconds: self.ttl_policy.ttl_seconds(),
            ttl_cleanup_enabled: self.ttl_policy.is_enabled(),
            messages_enqueued: metrics.enqueued(),
            messages_sent: metrics.sent(),
            messages_failed: metrics.failed(),
            queue_full_events: metrics.queue_full_events(),
            queue_size: self.queue.len(),
            loggers: self.registry.list(),
        }
    }

    pub fn ttl_status(&self) -> TtlStatus {
        TtlStatus {
            enabled: self.ttl_policy.is_enabled(),
            ttl_seconds: self.ttl_policy.ttl_seconds(),
            pool_size: self.registry.len(),
        }
    }

    /// Set the eviction switch, or toggle it when `enabled` is `None`
    ///
    /// Returns the new state.
    pub fn set_ttl_enabled(&self, enabled: Option<bool>) -> bool {
        self.ttl_policy.apply(enabled)
    }

    /// Run one eviction pass now instead of waiting for the reaper
    pub fn sweep(&self) -> Vec<LoggerId> {
        reaper::sweep(&self.registry, &self.ttl_policy, Utc::now())
    }

    pub fn remove_logger(&self, logger_id: &str) -> bool {
        self.registry.remove(logger_id)
    }

    /// Handle for the logger bound to a service label, created on first use
    pub fn service_logger(&self, service_name: &str) -> LoggerHandle {
        let logger_id = self.registry.get_or_create_by_label(service_name);
        self.registry.touch(logger_id.as_str());
        self.handle(logger_id)
    }

    pub fn default_logger(&self) -> LoggerHandle {
        self.service_logger(&self.default_service_name)
    }

    pub fn default_service_name(&self) -> &str {
        &self.default_service_name
    }

    /// Log through a service label, the default service when `None`
    ///
    /// If the label's logger is evicted between lookup and logging, the
    /// label is resolved once more to a fresh logger.
    pub fn log_service(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        service_name: Option<&str>,
        metadata: Option<LogMetadata>,
    ) -> Result<Dispatch> {
        let service_name = service_name.unwrap_or(&self.default_service_name);
        let message = message.into();

        match self
            .service_logger(service_name)
            .log(level, message.clone(), metadata.clone())
        {
            Err(e) if e.is_not_found() => self
                .service_logger(service_name)
                .log(level, message, metadata),
            result => result,
        }
    }

    pub fn configure_service(&self, service_name: &str, update: &LevelUpdate) -> LoggerConfig {
        self.registry.configure_service(service_name, update)
    }

    pub fn service_config(&self, service_name: &str) -> Option<LoggerConfig> {
        self.registry.service_config(service_name)
    }

    pub fn list_services(&self) -> BTreeMap<String, ServiceBinding> {
        self.registry.services()
    }

    /// Probe the transport and announce the pool on the default logger
    ///
    /// Returns the identity reported by the transport.
    pub fn check_transport(&self) -> Result<String> {
        let identity = self.transport.lock().probe()?;

        let metadata = LogMetadata::new().with_field("bot", identity.clone());
        self.default_logger()
            .info_with("Logger initialized", metadata)?;
        Ok(identity)
    }

    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        self.queue.metrics()
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.queue.overflow_policy()
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_running() && self.reaper.is_running()
    }

    /// Stop the reaper and the sender, waiting up to `timeout` for each
    ///
    /// Returns `true` if both threads exited in time. Records still queued
    /// are not delivered, and later log calls report [`Dispatch::Dropped`].
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let reaper_stopped = self.reaper.shutdown(timeout);
        let sender_stopped = self.sender.shutdown(timeout);
        reaper_stopped && sender_stopped
    }
}

impl Drop for LoggerPool {
    fn drop(&mut self) {
        self.shutdown(self.shutdown_timeout);
    }
}

impl std::fmt::Debug for LoggerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerPool")
            .field("default_service_name", &self.default_service_name)
            .field("pool_size", &self.registry.len())
            .field("ttl_policy", &self.ttl_policy)
            .field("queue_size", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`LoggerPool`]
///
/// # Example
/// ```
/// use relay_logger_pool::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> relay_logger_pool::Result<()> {
/// let pool = LoggerPool::builder()
///     .transport(ConsoleTransport::new())
///     .ttl(Duration::from_secs(600))
///     .sweep_interval(Duration::from_secs(30))
///     .queue_capacity(1000)
///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(20)))
///     .build()?;
///
/// assert_eq!(pool.ttl_status().ttl_seconds, 600);
/// # Ok(())
/// # }
/// ```
pub struct LoggerPoolBuilder {
    config: PoolConfig,
    transport: Option<Box<dyn Transport>>,
    overflow_policy: OverflowPolicy,
    ttl: Option<Duration>,
    sweep_interval: Option<Duration>,
}

impl LoggerPoolBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            transport: None,
            overflow_policy: OverflowPolicy::default(),
            ttl: None,
            sweep_interval: None,
        }
    }

    /// Replace every configurable field at once
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self.ttl = None;
        self.sweep_interval = None;
        self
    }

    /// Destination for delivered records
    ///
    /// Defaults to [`ConsoleTransport`](crate::ConsoleTransport) when the
    /// `console` feature is enabled.
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.config.default_service_name = service_name.into();
        self
    }

    /// Whole seconds; a fractional TTL is rejected by `build`
    #[must_use = "builder methods return a new value"]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Initial state of the eviction switch
    #[must_use = "builder methods return a new value"]
    pub fn cleanup_enabled(mut self, enabled: bool) -> Self {
        self.config.cleanup_enabled = enabled;
        self
    }

    /// Whole seconds; a sub-second interval is rejected by `build`
    #[must_use = "builder methods return a new value"]
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the policy applied when the dispatch queue is full
    ///
    /// Default is `DropNewest`.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Timeout used when the pool is dropped
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Validate the configuration and start the worker threads
    ///
    /// Fails with [`PoolError::WorkerSpawn`](super::error::PoolError::WorkerSpawn)
    /// if a thread cannot be started; no pool is created in that case.
    pub fn build(mut self) -> Result<LoggerPool> {
        if let Some(ttl) = self.ttl {
            self.config.ttl_seconds = whole_seconds("ttl", ttl)?;
        }
        if let Some(interval) = self.sweep_interval {
            self.config.sweep_interval_secs = whole_seconds("sweep_interval", interval)?;
        }
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let transport: SharedTransport = Arc::new(Mutex::new(transport));

        let registry = Arc::new(LoggerRegistry::new());
        let ttl_policy = Arc::new(TtlPolicy::new(
            self.config.ttl(),
            self.config.cleanup_enabled,
        ));

        let (queue, sender) = SenderWorker::spawn(
            Arc::clone(&transport),
            self.config.queue_capacity,
            self.config.poll_timeout(),
            self.overflow_policy,
        )?;
        let reaper = Reaper::spawn(
            Arc::clone(&registry),
            Arc::clone(&ttl_policy),
            self.config.sweep_interval(),
        )?;

        registry.get_or_create_by_label(&self.config.default_service_name);

        Ok(LoggerPool {
            registry,
            ttl_policy,
            queue,
            sender,
            reaper,
            transport,
            default_service_name: self.config.default_service_name.clone(),
            shutdown_timeout: self.config.shutdown_timeout(),
        })
    }
}

impl Default for LoggerPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn whole_seconds(setting: &str, value: Duration) -> Result<u64> {
    if value.subsec_nanos() != 0 {
        return Err(super::error::PoolError::config(
            "LoggerPoolBuilder",
            format!("{} must be whole seconds, got {:?}", setting, value),
        ));
    }
    Ok(value.as_secs())
}

#[cfg(feature = "console")]
fn default_transport() -> Result<Box<dyn Transport>> {
    Ok(Box::new(crate::transports::ConsoleTransport::new()))
}

#[cfg(not(feature = "console"))]
fn default_transport() -> Result<Box<dyn Transport>> {
    Err(super::error::PoolError::config(
        "LoggerPoolBuilder",
        "no transport given and the console feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogRecord, PoolError};
    use std::thread;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        records: Arc<Mutex<Vec<LogRecord>>>,
    }

    impl Transport for RecordingTransport {
        fn deliver(&mut self, record: &LogRecord) -> Result<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }

        fn probe(&mut self) -> Result<String> {
            Ok("recorder_bot".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct UnreachableTransport;

    impl Transport for UnreachableTransport {
        fn deliver(&mut self, _record: &LogRecord) -> Result<()> {
            Err(PoolError::transport("unreachable", "connection refused"))
        }

        fn probe(&mut self) -> Result<String> {
            Err(PoolError::transport("unreachable", "connection refused"))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    fn recording_pool() -> (LoggerPool, Arc<Mutex<Vec<LogRecord>>>) {
        let transport = RecordingTransport::default();
        let records = Arc::clone(&transport.records);
        let pool = LoggerPool::builder()
            .transport(transport)
            .poll_timeout(Duration::from_millis(10))
            .build()
            .unwrap();
        (pool, records)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while !condition() {
            if start.elapsed() > Duration::from_secs(2) {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    #[test]
    fn test_builder_defaults() {
        let (pool, _) = recording_pool();
        let status = pool.ttl_status();
        assert!(status.enabled);
        assert_eq!(status.ttl_seconds, 3600);
        assert_eq!(status.pool_size, 1);
        assert_eq!(pool.default_service_name(), "file-server");
        assert_eq!(pool.overflow_policy(), OverflowPolicy::DropNewest);
        assert!(pool.is_running());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .queue_capacity(0)
            .build();
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));

        let result = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .sweep_interval(Duration::from_millis(500))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_fractional_seconds() {
        let result = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .ttl(Duration::from_millis(1500))
            .build();
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));

        let result = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .sweep_interval(Duration::from_millis(2500))
            .build();
        assert!(matches!(result, Err(PoolError::InvalidConfiguration { .. })));

        let pool = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .ttl(Duration::from_secs(2))
            .build()
            .unwrap();
        assert_eq!(pool.ttl_status().ttl_seconds, 2);
    }

    #[test]
    fn test_config_overrides_earlier_duration_setters() {
        let config = PoolConfig {
            ttl_seconds: 90,
            ..PoolConfig::default()
        };
        let pool = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .ttl(Duration::from_millis(1500))
            .config(config)
            .build()
            .unwrap();
        assert_eq!(pool.ttl_status().ttl_seconds, 90);
    }

    #[test]
    fn test_default_logger_exists_at_startup() {
        let (pool, _) = recording_pool();
        let services = pool.list_services();
        assert!(services.contains_key("file-server"));
        assert_eq!(pool.default_logger().id(), &services["file-server"].logger_id);
    }

    #[test]
    fn test_records_reach_transport() {
        let (pool, records) = recording_pool();
        let id = pool.create_logger("uploader", false, true, true);

        assert_eq!(
            pool.log(id.as_str(), LogLevel::Info, "stored", None).unwrap(),
            Dispatch::Enqueued
        );
        assert!(wait_for(|| records.lock().len() == 1));

        let record = records.lock()[0].clone();
        assert_eq!(record.service, "uploader");
        assert_eq!(record.message, "stored");
        assert!(wait_for(|| pool.stats().messages_sent == 1));
    }

    #[test]
    fn test_logger_touches_but_info_does_not() {
        let (pool, _) = recording_pool();
        let id = pool.create_logger("svc", false, true, true);
        let before = pool.logger_info(id.as_str()).unwrap().last_used;

        thread::sleep(Duration::from_millis(5));
        assert_eq!(pool.logger_info(id.as_str()).unwrap().last_used, before);
        assert!(pool.config(id.as_str()).is_some());
        assert_eq!(pool.logger_info(id.as_str()).unwrap().last_used, before);

        pool.logger(id.as_str()).unwrap();
        assert!(pool.logger_info(id.as_str()).unwrap().last_used > before);
    }

    #[test]
    fn test_log_str_rejects_unknown_level_without_side_effects() {
        let (pool, _) = recording_pool();
        let id = pool.create_logger("svc", true, true, true);

        let err = pool
            .log_str(id.as_str(), "verbose", "message", None)
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidLevel { .. }));
        assert_eq!(pool.logger_info(id.as_str()).unwrap().message_count, 0);
        assert_eq!(pool.metrics().enqueued(), 0);

        assert_eq!(
            pool.log_str(id.as_str(), "WARN", "message", None).unwrap(),
            Dispatch::Enqueued
        );
    }

    #[test]
    fn test_unknown_identity() {
        let (pool, _) = recording_pool();
        assert!(pool.logger("missing").is_none());
        assert!(pool.logger_info("missing").is_none());
        assert!(pool
            .update_config("missing", &LevelUpdate::new().debug(true))
            .is_none());
        assert!(pool
            .log("missing", LogLevel::Error, "x", None)
            .unwrap_err()
            .is_not_found());
        assert!(!pool.remove_logger("missing"));
    }

    #[test]
    fn test_send_test_message() {
        let (pool, records) = recording_pool();
        let id = pool.create_logger("svc", false, true, true);

        assert!(pool.send_test_message(id.as_str()).unwrap().is_enqueued());
        assert!(wait_for(|| records.lock().len() == 1));

        let record = records.lock()[0].clone();
        assert!(record.message.starts_with("Test message from API at "));
        let metadata = record.metadata.unwrap();
        assert_eq!(metadata.get("test"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_log_service_uses_default_label() {
        let (pool, records) = recording_pool();

        pool.log_service(LogLevel::Warning, "disk low", None, None)
            .unwrap();
        pool.log_service(LogLevel::Error, "upload failed", Some("uploader"), None)
            .unwrap();
        assert!(wait_for(|| records.lock().len() == 2));

        let services: Vec<_> = records.lock().iter().map(|r| r.service.clone()).collect();
        assert_eq!(services, vec!["file-server", "uploader"]);
        assert_eq!(pool.list_services().len(), 2);
    }

    #[test]
    fn test_configure_service() {
        let (pool, _) = recording_pool();
        let update = LevelUpdate::new().debug(true).info(false);
        let config = pool.configure_service("importer", &update);

        assert!(config.is_enabled(LogLevel::Debug));
        assert!(!config.is_enabled(LogLevel::Info));
        assert_eq!(pool.service_config("importer"), Some(config));
        assert!(pool.service_config("unknown").is_none());
    }

    #[test]
    fn test_check_transport_announces_identity() {
        let (pool, records) = recording_pool();

        assert_eq!(pool.check_transport().unwrap(), "recorder_bot");
        assert!(wait_for(|| records.lock().len() == 1));

        let record = records.lock()[0].clone();
        assert_eq!(record.message, "Logger initialized");
        assert_eq!(record.service, "file-server");
        assert_eq!(
            record.metadata.unwrap().get("bot"),
            Some(&serde_json::Value::from("recorder_bot"))
        );
    }

    #[test]
    fn test_failed_delivery_is_counted_not_surfaced() {
        let pool = LoggerPool::builder()
            .transport(UnreachableTransport)
            .poll_timeout(Duration::from_millis(10))
            .build()
            .unwrap();

        assert!(pool.check_transport().is_err());
        assert!(pool
            .log_service(LogLevel::Critical, "down", None, None)
            .unwrap()
            .is_enqueued());
        assert!(wait_for(|| pool.stats().messages_failed == 1));
        assert_eq!(pool.stats().messages_sent, 0);
    }

    #[test]
    fn test_sweep_now() {
        let pool = LoggerPool::builder()
            .transport(RecordingTransport::default())
            .ttl(Duration::ZERO)
            .build()
            .unwrap();
        let id = pool.create_logger("short", false, true, true);

        thread::sleep(Duration::from_millis(5));
        let evicted = pool.sweep();
        assert!(evicted.contains(&id));
        assert!(pool.logger(id.as_str()).is_none());
    }

    #[test]
    fn test_shutdown_then_log_drops() {
        let (mut pool, _) = recording_pool();
        let logger = pool.default_logger();

        assert!(pool.shutdown(Duration::from_secs(1)));
        assert!(!pool.is_running());
        assert_eq!(logger.info("late").unwrap(), Dispatch::Dropped);
        assert_eq!(pool.metrics().failed(), 1);
    }
}
