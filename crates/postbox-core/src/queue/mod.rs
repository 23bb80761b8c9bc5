//! Queue module: backlog, retry policy, and the in-memory dispatch queue.

mod backlog;
mod memory;
mod receipt;
mod retry;
mod status;

pub use backlog::Backlog;
pub use memory::{EmailQueue, EmailQueueBuilder};
pub use receipt::DeliveryReceipt;
pub use retry::{DEFAULT_MAX_DELAY, RetryPolicy};
pub use status::{DispatchStats, QueueStatus};
