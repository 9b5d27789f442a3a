//! Shared plumbing for the pool's background threads

use std::thread;
use std::time::{Duration, Instant};

/// Wait for a worker thread to finish, giving up after `timeout`
///
/// Returns `true` if the thread exited cleanly within the timeout.
pub(crate) fn join_with_timeout(
    handle: thread::JoinHandle<()>,
    timeout: Duration,
    worker: &str,
) -> bool {
    let start = Instant::now();

    loop {
        if handle.is_finished() {
            return match handle.join() {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("[POOL ERROR] {} worker panicked during shutdown: {:?}", worker, e);
                    false
                }
            };
        }

        if start.elapsed() >= timeout {
            eprintln!(
                "[POOL WARNING] {} worker did not stop within {:?}",
                worker, timeout
            );
            return false;
        }

        // Small sleep to avoid busy-waiting
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_finished_thread() {
        let handle = thread::spawn(|| {});
        assert!(join_with_timeout(handle, Duration::from_secs(1), "test"));
    }

    #[test]
    fn test_join_times_out() {
        let handle = thread::spawn(|| thread::sleep(Duration::from_millis(300)));
        assert!(!join_with_timeout(handle, Duration::from_millis(20), "test"));
    }

    #[test]
    fn test_join_panicked_thread() {
        let handle = thread::spawn(|| panic!("worker exploded"));
        assert!(!join_with_timeout(handle, Duration::from_secs(1), "test"));
    }
}
