//! FnDelivery - adapter that lets a closure act as an `EmailDelivery`.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::{Parameters, TemplateId};
use crate::error::DeliveryError;
use crate::ports::EmailDelivery;

/// Wraps `Fn(TemplateId, Parameters) -> impl Future<Output = Result<bool, DeliveryError>>`.
///
/// ```ignore
/// let delivery = FnDelivery::new(|template_id, params| async move {
///     client.send(template_id.as_str(), &params).await
/// });
/// ```
pub struct FnDelivery<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnDelivery<F, Fut>
where
    F: Fn(TemplateId, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, DeliveryError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> EmailDelivery for FnDelivery<F, Fut>
where
    F: Fn(TemplateId, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, DeliveryError>> + Send,
{
    async fn deliver(
        &self,
        template_id: &TemplateId,
        parameters: &Parameters,
    ) -> Result<bool, DeliveryError> {
        (self.f)(template_id.clone(), parameters.clone()).await
    }
}
