use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskId;
use crate::error::PostboxError;

/// Parameter bag handed to the delivery capability (recipient, substitution
/// variables, ...). Shape is not validated at enqueue time.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Opaque identifier of an email template / integration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(s: impl Into<String>) -> Result<Self, PostboxError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(PostboxError::EmptyTemplateId);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TemplateId {
    type Error = PostboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TemplateId> for String {
    fn from(value: TemplateId) -> Self {
        value.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Scheduling priority. Only affects queue position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// One tier up (`High` stays `High`).
    pub fn promoted(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium | Priority::High => Priority::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work awaiting delivery.
///
/// Lifecycle:
/// - created by `enqueue` with `attempts = 0`
/// - `attempts` is bumped each time a delivery attempt starts
/// - removed on success, or once a failure leaves `attempts >= max_attempts`
#[derive(Debug, Clone, Serialize)]
pub struct QueuedTask {
    pub id: TaskId,
    pub template_id: TemplateId,
    pub parameters: Parameters,

    /// Current tier. May differ from `original_priority` after a starvation boost.
    pub priority: Priority,
    pub original_priority: Priority,

    pub attempts: u32,
    pub max_attempts: u32,

    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedTask {
    pub fn new(
        template_id: TemplateId,
        parameters: Parameters,
        priority: Priority,
        max_attempts: u32,
    ) -> Result<Self, PostboxError> {
        if max_attempts == 0 {
            return Err(PostboxError::InvalidMaxAttempts(max_attempts));
        }
        Ok(Self {
            id: TaskId::generate(),
            template_id,
            parameters,
            priority,
            original_priority: priority,
            attempts: 0,
            max_attempts,
            last_error: None,
            enqueued_at: Utc::now(),
        })
    }

    pub fn start_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Time since enqueue, retries and backoff included. Zero if the wall
    /// clock stepped backwards.
    pub fn queued_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.enqueued_at).to_std().unwrap_or(Duration::ZERO)
    }
}
