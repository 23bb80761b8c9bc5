//! EventSink port - where dispatch events go.
//!
//! Implementations must not block: `emit` is called from inside the dispatch
//! loop, sometimes while the queue's state lock is held. They must not call
//! back into the `EmailQueue`.
//!
//! Events for one task arrive in lifecycle order: `Enqueued` (and
//! `RetryScheduled`) is emitted before the task can be picked up again.

use crate::domain::DispatchEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DispatchEvent);
}
