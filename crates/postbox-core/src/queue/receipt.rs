use tokio::sync::oneshot;

use crate::domain::{DeliveryOutcome, TaskId};

/// Handle returned by `enqueue`.
///
/// Dropping it is the fire-and-forget path; the task is delivered either way.
/// Awaiting `outcome()` never influences delivery latency of other tasks.
#[derive(Debug)]
pub struct DeliveryReceipt {
    task_id: TaskId,
    rx: oneshot::Receiver<DeliveryOutcome>,
}

impl DeliveryReceipt {
    pub(crate) fn new(task_id: TaskId, rx: oneshot::Receiver<DeliveryOutcome>) -> Self {
        Self { task_id, rx }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Wait for the task to leave the queue.
    pub async fn outcome(self) -> DeliveryOutcome {
        // sender gone without a word: the queue itself was torn down
        self.rx
            .await
            .unwrap_or(DeliveryOutcome::Abandoned { attempts: 0 })
    }

    /// Non-blocking check. `None` while the task is still queued or in flight.
    pub fn try_outcome(&mut self) -> Option<DeliveryOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(DeliveryOutcome::Abandoned { attempts: 0 })
            }
        }
    }
}
