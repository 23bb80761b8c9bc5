//! Queue configuration.
//!
//! Sources, in order of preference:
//! - code (`QueueConfig::default()` + builder methods)
//! - a JSON file (`QueueConfig::from_json_file`), durations in milliseconds
//! - environment variables (`QueueConfig::from_env`)
//!
//! Every source goes through `validate()` before a queue is built from it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::queue::RetryPolicy;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of delivery calls in flight at once.
    pub concurrency: usize,

    /// `max_attempts` used by `enqueue_default`.
    pub default_max_attempts: u32,

    /// Per-attempt limit. `None` lets a hung delivery call hold its slot forever.
    #[serde(rename = "attempt_timeout_ms", with = "millis_opt")]
    pub attempt_timeout: Option<Duration>,

    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: Some(DEFAULT_ATTEMPT_TIMEOUT),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_default_max_attempts(mut self, max_attempts: u32) -> Self {
        self.default_max_attempts = max_attempts;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.default_max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if !(self.retry.multiplier >= 1.0) {
            return Err(ConfigError::InvalidMultiplier(self.retry.multiplier));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::InvalidJitter(self.retry.jitter));
        }
        if !self.retry.base_delay.is_zero() && self.retry.max_delay < self.retry.base_delay {
            return Err(ConfigError::MaxDelayBelowBase {
                base: self.retry.base_delay,
                max: self.retry.max_delay,
            });
        }
        if self.retry.promote_after == Some(0) {
            return Err(ConfigError::ZeroPromoteAfter);
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Load from `POSTBOX_*` environment variables on top of the defaults.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `POSTBOX_CONCURRENCY` | `concurrency` |
    /// | `POSTBOX_MAX_ATTEMPTS` | `default_max_attempts` |
    /// | `POSTBOX_ATTEMPT_TIMEOUT_MS` | `attempt_timeout` (`0` disables) |
    /// | `POSTBOX_RETRY_BASE_MS` | `retry.base_delay` |
    /// | `POSTBOX_RETRY_MULTIPLIER` | `retry.multiplier` |
    /// | `POSTBOX_RETRY_MAX_MS` | `retry.max_delay` |
    /// | `POSTBOX_RETRY_JITTER` | `retry.jitter` |
    /// | `POSTBOX_PROMOTE_AFTER` | `retry.promote_after` (`0` disables) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<usize, _>(&lookup, "POSTBOX_CONCURRENCY")? {
            config.concurrency = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "POSTBOX_MAX_ATTEMPTS")? {
            config.default_max_attempts = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "POSTBOX_ATTEMPT_TIMEOUT_MS")? {
            config.attempt_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "POSTBOX_RETRY_BASE_MS")? {
            config.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, "POSTBOX_RETRY_MULTIPLIER")? {
            config.retry.multiplier = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "POSTBOX_RETRY_MAX_MS")? {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var::<f64, _>(&lookup, "POSTBOX_RETRY_JITTER")? {
            config.retry.jitter = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, "POSTBOX_PROMOTE_AFTER")? {
            config.retry.promote_after = (v > 0).then_some(v);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw.clone(),
        })
}

/// `Duration` <-> integer milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// `Option<Duration>` <-> optional integer milliseconds.
pub(crate) mod millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis().min(u64::MAX as u128) as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
