//! Dispatch queue and the single sender worker draining it

use super::{
    error::{PoolError, Result},
    log_record::LogRecord,
    metrics::DispatchMetrics,
    overflow_policy::OverflowPolicy,
    transport::Transport,
    worker::join_with_timeout,
};
use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default time to wait for the sender worker when the pool is dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport shared between the sender worker and the pool (for probing)
pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Outcome of a single log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Record placed on the queue
    Enqueued,
    /// Level disabled for this logger; nothing happened
    Filtered,
    /// Queue full or closed; record discarded and counted as failed
    Dropped,
}

impl Dispatch {
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Dispatch::Enqueued)
    }
}

/// First failure and every 1000th thereafter
fn should_alert(previous: u64) -> bool {
    previous == 0 || (previous + 1) % 1000 == 0
}

/// Producer side of the bounded record queue
///
/// Cheap to clone; every logger handle carries one.
#[derive(Clone)]
pub struct DispatchQueue {
    sender: Sender<LogRecord>,
    capacity: usize,
    metrics: Arc<DispatchMetrics>,
    overflow_policy: OverflowPolicy,
}

impl DispatchQueue {
    /// Push a record without blocking beyond the overflow policy's bound
    pub fn push(&self, record: LogRecord) -> Dispatch {
        match self.sender.try_send(record) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Dispatch::Enqueued
            }
            Err(TrySendError::Full(record)) => self.handle_overflow(record),
            Err(TrySendError::Disconnected(_)) => {
                // sender worker already stopped
                self.metrics.record_failed();
                Dispatch::Dropped
            }
        }
    }

    fn handle_overflow(&self, record: LogRecord) -> Dispatch {
        self.metrics.record_queue_full();

        match self.overflow_policy {
            OverflowPolicy::DropNewest => self.alert_and_drop(),
            OverflowPolicy::BlockWithTimeout(timeout) => {
                match self.sender.send_timeout(record, timeout) {
                    Ok(()) => {
                        self.metrics.record_enqueued();
                        Dispatch::Enqueued
                    }
                    Err(SendTimeoutError::Timeout(_)) => self.alert_and_drop(),
                    Err(SendTimeoutError::Disconnected(_)) => {
                        self.metrics.record_failed();
                        Dispatch::Dropped
                    }
                }
            }
        }
    }

    fn alert_and_drop(&self) -> Dispatch {
        let previous = self.metrics.record_failed();

        if should_alert(previous) {
            eprintln!(
                "[POOL WARNING] Dispatch queue full ({} slots), {} records failed so far. \
                 Consider a larger queue_capacity.",
                self.capacity,
                previous + 1
            );
        }
        Dispatch::Dropped
    }

    /// Records currently waiting for the sender
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}

/// Background thread relaying queued records to the transport
///
/// Runs until [`SenderWorker::shutdown`] sets the stop flag; the flag is
/// observed at the next poll. Records still queued at that point are lost.
pub struct SenderWorker {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    /// Kept to report undelivered records; dropped on shutdown so later
    /// pushes see a closed queue
    pending: Option<Receiver<LogRecord>>,
}

impl SenderWorker {
    /// Create the queue and start the sender thread
    pub fn spawn(
        transport: SharedTransport,
        capacity: usize,
        poll_timeout: Duration,
        overflow_policy: OverflowPolicy,
    ) -> Result<(DispatchQueue, SenderWorker)> {
        if capacity == 0 {
            return Err(PoolError::config(
                "DispatchQueue",
                "capacity must be greater than zero",
            ));
        }

        let (sender, receiver) = bounded(capacity);
        let metrics = Arc::new(DispatchMetrics::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_receiver = receiver.clone();
        let worker_metrics = Arc::clone(&metrics);
        let worker_shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("pool-sender".to_string())
            .spawn(move || {
                while !worker_shutdown.load(Ordering::Acquire) {
                    match worker_receiver.recv_timeout(poll_timeout) {
                        Ok(record) => Self::deliver(&transport, &record, &worker_metrics),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| PoolError::worker_spawn("sender", e))?;

        let queue = DispatchQueue {
            sender,
            capacity,
            metrics,
            overflow_policy,
        };
        let worker = SenderWorker {
            shutdown,
            handle: Some(handle),
            pending: Some(receiver),
        };
        Ok((queue, worker))
    }

    /// Deliver one record, isolating transport panics
    fn deliver(transport: &SharedTransport, record: &LogRecord, metrics: &DispatchMetrics) {
        let mut transport = transport.lock();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            transport.deliver(record)
        }));

        match result {
            Ok(Ok(())) => {
                metrics.record_sent();
            }
            Ok(Err(e)) => {
                let previous = metrics.record_failed();
                if should_alert(previous) {
                    eprintln!(
                        "[POOL ERROR] Transport '{}' failed ({} failures so far): {}",
                        transport.name(),
                        previous + 1,
                        e
                    );
                }
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                let previous = metrics.record_failed();
                if should_alert(previous) {
                    eprintln!(
                        "[POOL CRITICAL] Transport '{}' panicked: {}. Sender keeps running.",
                        transport.name(),
                        panic_msg
                    );
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and wait up to `timeout` for it to exit
    ///
    /// Returns `true` if the thread exited within the timeout. Calling it
    /// again after a successful shutdown is a no-op returning `true`.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.shutdown.store(true, Ordering::Release);

        let finished = match self.handle.take() {
            Some(handle) => join_with_timeout(handle, timeout, "sender"),
            None => true,
        };

        if let Some(pending) = self.pending.take() {
            let lost = pending.len();
            if lost > 0 {
                eprintln!(
                    "[POOL WARNING] Sender stopped with {} queued records undelivered",
                    lost
                );
            }
        }

        finished
    }
}

impl Drop for SenderWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}
