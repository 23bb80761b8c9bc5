//! Error types.
//!
//! - `PostboxError`: enqueue / construction failures surfaced to the caller.
//! - `DeliveryError`: failures reported by (or around) the delivery capability.
//!   These never reach the caller of `enqueue`; the dispatch loop turns them into
//!   a retry or a drop.
//! - `ConfigError`: invalid `QueueConfig`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostboxError {
    #[error("template id must not be empty")]
    EmptyTemplateId,

    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(u32),

    #[error("parameters for template {template_id} must serialize to a JSON object: {reason}")]
    InvalidParameters { template_id: String, reason: String },

    #[error("queue is shut down")]
    Closed,

    #[error("email queue must be created inside a tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The delivery API answered but declined the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// Network / HTTP / provider failure.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("delivery attempt timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("delivery call panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("default_max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("retry multiplier must be >= 1.0 (got {0})")]
    InvalidMultiplier(f64),

    #[error("retry jitter must be within 0.0..=1.0 (got {0})")]
    InvalidJitter(f64),

    #[error("retry max_delay {max:?} is below base_delay {base:?}")]
    MaxDelayBelowBase {
        base: std::time::Duration,
        max: std::time::Duration,
    },

    #[error("promote_after must be at least 1 when set")]
    ZeroPromoteAfter,

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: String, value: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}
