//! EmailDelivery port - "deliver one templated email".
//!
//! The concrete implementation (an HTTP call to a transactional-email API)
//! lives outside this crate. The queue only relies on the contract below.

use async_trait::async_trait;

use crate::domain::{Parameters, TemplateId};
use crate::error::DeliveryError;

/// The delivery capability.
///
/// # Contract
/// - `Ok(true)`: delivered.
/// - `Ok(false)`: the provider reported failure.
/// - `Err(_)`: transport failure.
///
/// `Ok(false)`, `Err(_)`, a panic and an attempt timeout are all treated the
/// same way by the queue: one failed attempt, subject to the retry policy.
#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn deliver(
        &self,
        template_id: &TemplateId,
        parameters: &Parameters,
    ) -> Result<bool, DeliveryError>;
}
