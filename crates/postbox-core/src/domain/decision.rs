//! Decision model: what to do with a task after a failed attempt.

use std::time::Duration;

use super::{Priority, QueuedTask};
use crate::error::DeliveryError;
use crate::queue::RetryPolicy;

/// The next action for a failed task.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Put the task back into the backlog (after `delay`, at the back of `priority`).
    Retry {
        delay: Duration,
        priority: Priority,
        reason: String,
    },

    /// Drop the task (attempts exhausted).
    MarkDead { reason: String },
}

/// Decides the next action based on the task and the failure.
///
/// Pure: no side effects. The dispatch loop applies the returned decision.
pub trait Decider: Send + Sync {
    fn decide(&self, task: &QueuedTask, error: &DeliveryError) -> Decision;
}

/// Attempt-count based retry:
/// - retry while `attempts < max_attempts`
/// - delay and starvation boost come from `RetryPolicy`
#[derive(Debug, Clone)]
pub struct DefaultDecider {
    retry_policy: RetryPolicy,
}

impl DefaultDecider {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

impl Decider for DefaultDecider {
    fn decide(&self, task: &QueuedTask, error: &DeliveryError) -> Decision {
        if !task.has_attempts_left() {
            return Decision::MarkDead {
                reason: format!(
                    "max attempts reached: {}/{} ({error})",
                    task.attempts, task.max_attempts
                ),
            };
        }

        // attempts == number of failures so far
        let delay = self.retry_policy.next_delay(task.attempts);
        let priority = self.retry_policy.retry_priority(task.priority, task.attempts);
        Decision::Retry {
            delay,
            priority,
            reason: format!(
                "retry attempt {}/{} after {:?} ({error})",
                task.attempts + 1,
                task.max_attempts,
                delay
            ),
        }
    }
}
