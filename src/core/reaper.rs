//! TTL eviction: the eviction switch and the background sweep thread

use super::{
    error::{PoolError, Result},
    logger_id::LoggerId,
    registry::LoggerRegistry,
    worker::join_with_timeout,
};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Idle time-to-live and the process-wide eviction switch
///
/// # Example
///
/// ```
/// use relay_logger_pool::TtlPolicy;
/// use std::time::Duration;
///
/// let policy = TtlPolicy::new(Duration::from_secs(3600), true);
/// assert!(!policy.toggle());
/// assert!(policy.toggle());
/// ```
#[derive(Debug)]
pub struct TtlPolicy {
    enabled: AtomicBool,
    ttl: Duration,
}

impl TtlPolicy {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            ttl,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Returns the new state
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.store(enabled, Ordering::Release);
        enabled
    }

    /// Flip the switch atomically, returning the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }

    /// Set when given a value, toggle otherwise
    pub fn apply(&self, enabled: Option<bool>) -> bool {
        match enabled {
            Some(enabled) => self.set_enabled(enabled),
            None => self.toggle(),
        }
    }
}

/// One sweep: evict every entry idle for longer than the TTL
///
/// Does nothing while eviction is disabled. Returns the evicted identities.
pub fn sweep(registry: &LoggerRegistry, policy: &TtlPolicy, now: DateTime<Utc>) -> Vec<LoggerId> {
    if !policy.is_enabled() {
        return Vec::new();
    }

    registry
        .expired(now, policy.ttl())
        .into_iter()
        .filter(|logger_id| registry.remove_if_expired(logger_id.as_str(), now, policy.ttl()))
        .collect()
}

/// Background thread running [`sweep`] on a fixed interval
///
/// Eviction latency is bounded by the interval. Dropping the stop channel
/// wakes the thread immediately, so shutdown never waits a full interval.
pub struct Reaper {
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Reaper {
    pub fn spawn(
        registry: Arc<LoggerRegistry>,
        policy: Arc<TtlPolicy>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(PoolError::config(
                "Reaper",
                "sweep interval must be greater than zero",
            ));
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("pool-reaper".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        sweep(&registry, &policy, Utc::now());
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| PoolError::worker_spawn("reaper", e))?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the sweep thread and wait up to `timeout` for it
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.stop.take());

        match self.handle.take() {
            Some(handle) => join_with_timeout(handle, timeout, "reaper"),
            None => true,
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown(super::dispatch::DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}
