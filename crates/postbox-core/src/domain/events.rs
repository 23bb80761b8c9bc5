//! Dispatch events, emitted to an `EventSink` as the queue works.

use std::time::Duration;

use serde::Serialize;

use super::{Priority, TaskId, TemplateId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    Enqueued {
        task_id: TaskId,
        template_id: TemplateId,
        priority: Priority,
    },
    Dispatched {
        task_id: TaskId,
        template_id: TemplateId,
        attempt: u32,
    },
    Delivered {
        task_id: TaskId,
        template_id: TemplateId,
        attempts: u32,
        /// Enqueue to delivery, retries included.
        #[serde(rename = "queued_ms", with = "crate::config::millis")]
        queued_for: Duration,
    },
    RetryScheduled {
        task_id: TaskId,
        template_id: TemplateId,
        attempts: u32,
        max_attempts: u32,
        priority: Priority,
        #[serde(with = "crate::config::millis")]
        delay: Duration,
        error: String,
    },
    /// Permanent failure. Nobody else hears about it, so sinks should alert on this.
    Exhausted {
        task_id: TaskId,
        template_id: TemplateId,
        attempts: u32,
        error: String,
        #[serde(rename = "queued_ms", with = "crate::config::millis")]
        queued_for: Duration,
    },
    Abandoned {
        task_id: TaskId,
        template_id: TemplateId,
        attempts: u32,
    },
}

impl DispatchEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            DispatchEvent::Enqueued { task_id, .. }
            | DispatchEvent::Dispatched { task_id, .. }
            | DispatchEvent::Delivered { task_id, .. }
            | DispatchEvent::RetryScheduled { task_id, .. }
            | DispatchEvent::Exhausted { task_id, .. }
            | DispatchEvent::Abandoned { task_id, .. } => *task_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispatchEvent::Enqueued { .. } => "enqueued",
            DispatchEvent::Dispatched { .. } => "dispatched",
            DispatchEvent::Delivered { .. } => "delivered",
            DispatchEvent::RetryScheduled { .. } => "retry_scheduled",
            DispatchEvent::Exhausted { .. } => "exhausted",
            DispatchEvent::Abandoned { .. } => "abandoned",
        }
    }
}
