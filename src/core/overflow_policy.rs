//! Overflow policies for the dispatch queue
//!
//! Logging is fire-and-forget: a full queue may delay a caller for a short,
//! bounded time at most, never indefinitely.

use std::fmt;
use std::time::Duration;

/// What to do with a new record when the dispatch queue is full
///
/// # Example
///
/// ```
/// use relay_logger_pool::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: drop immediately and count as failed
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::DropNewest);
///
/// // Wait briefly for space, then drop
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the new record without waiting
    #[default]
    DropNewest,

    /// Wait up to the given duration for space, then drop
    BlockWithTimeout(Duration),
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
        }
    }
}
