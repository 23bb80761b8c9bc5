//! EventSink implementations.
//!
//! - **TracingEventSink**: structured `tracing` events (default)
//! - **NoopEventSink**: discards everything
//! - **RecordingEventSink**: keeps events in memory (tests, demos)

use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::domain::{DispatchEvent, TaskId};
use crate::ports::EventSink;

/// Logs every event. Exhausted tasks are logged at `error` since nobody else
/// is told about them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingEventSink {
    fn emit(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::Enqueued {
                task_id,
                template_id,
                priority,
            } => debug!(%task_id, %template_id, %priority, "email enqueued"),
            DispatchEvent::Dispatched {
                task_id,
                template_id,
                attempt,
            } => debug!(%task_id, %template_id, attempt, "email dispatched"),
            DispatchEvent::Delivered {
                task_id,
                template_id,
                attempts,
                queued_for,
            } => info!(
                %task_id,
                %template_id,
                attempts,
                queued_ms = queued_for.as_millis() as u64,
                "email delivered"
            ),
            DispatchEvent::RetryScheduled {
                task_id,
                template_id,
                attempts,
                max_attempts,
                priority,
                delay,
                error,
            } => warn!(
                %task_id,
                %template_id,
                attempts,
                max_attempts,
                %priority,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "email delivery failed, retrying"
            ),
            DispatchEvent::Exhausted {
                task_id,
                template_id,
                attempts,
                error,
                queued_for,
            } => error!(
                %task_id,
                %template_id,
                attempts,
                error = %error,
                queued_ms = queued_for.as_millis() as u64,
                "email delivery permanently failed"
            ),
            DispatchEvent::Abandoned {
                task_id,
                template_id,
                attempts,
            } => warn!(%task_id, %template_id, attempts, "email abandoned on shutdown"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &DispatchEvent) {}
}

#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event names for one task, in emission order.
    pub fn history(&self, task_id: TaskId) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.task_id() == task_id)
            .map(DispatchEvent::name)
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &DispatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
