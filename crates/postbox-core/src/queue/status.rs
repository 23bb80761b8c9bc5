//! Status views.

use serde::{Deserialize, Serialize};

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Tasks waiting to be dispatched (in-flight and backoff-waiting tasks excluded).
    pub queue_length: usize,

    /// Whether the dispatch loop has work (backlog, in-flight, or waiting retries).
    pub processing: bool,

    pub in_flight: usize,

    /// Failed tasks sleeping out a backoff delay before re-entering the backlog.
    pub retry_waiting: usize,
}

/// Running totals since the queue was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub delivered: u64,
    /// Failed attempts that were scheduled for another try.
    pub retried: u64,
    /// Tasks dropped after their last attempt failed.
    pub exhausted: u64,
    /// Attempts cut off by the per-attempt timeout.
    pub timed_out: u64,
    pub abandoned: u64,
}
