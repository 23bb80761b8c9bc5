//! Terminal results of a queued email.

use serde::{Deserialize, Serialize};

/// How a task left the queue.
///
/// Serialized as SCREAMING_SNAKE_CASE (`DELIVERED` / `EXHAUSTED` / `ABANDONED`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryOutcome {
    /// The delivery capability accepted the email.
    Delivered { attempts: u32 },

    /// Every allowed attempt failed; the task was dropped.
    Exhausted { attempts: u32, last_error: String },

    /// The queue shut down before the task could finish.
    Abandoned { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts }
            | DeliveryOutcome::Exhausted { attempts, .. }
            | DeliveryOutcome::Abandoned { attempts } => *attempts,
        }
    }
}
