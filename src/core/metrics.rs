//! Dispatch metrics for observability
//!
//! Counters for the sender worker and the dispatch queue: records accepted,
//! delivered, failed and queue saturation events.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the dispatch pipeline
///
/// # Example
///
/// ```
/// use relay_logger_pool::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_sent();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.sent(), 1);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Records accepted onto the queue
    enqueued: AtomicU64,

    /// Records delivered successfully by the transport
    sent: AtomicU64,

    /// Records that failed delivery or were dropped before reaching the worker
    failed: AtomicU64,

    /// Number of times the queue was full when a record arrived
    queue_full_events: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been sent or failed yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed() as f64;
        let total = self.sent() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            sent: AtomicU64::new(self.sent()),
            failed: AtomicU64::new(self.failed()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
        }
    }
}
