//! Simulated delivery capability for the demo: random latency, random failures.

use std::time::Duration;

use async_trait::async_trait;
use postbox_core::{DeliveryError, EmailDelivery, Parameters, TemplateId};
use rand::Rng;

pub struct SimulatedDelivery {
    /// Probability (0.0..=1.0) that one call fails.
    fail_rate: f64,
    latency: Duration,
}

impl SimulatedDelivery {
    pub fn new(fail_rate: f64, latency: Duration) -> Self {
        Self {
            fail_rate: if fail_rate.is_nan() { 0.0 } else { fail_rate.clamp(0.0, 1.0) },
            latency,
        }
    }
}

#[async_trait]
impl EmailDelivery for SimulatedDelivery {
    async fn deliver(
        &self,
        template_id: &TemplateId,
        parameters: &Parameters,
    ) -> Result<bool, DeliveryError> {
        // thread_rng is !Send: decide before the await
        let (jitter_ms, roll, transport) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(0..=self.latency.as_millis() as u64),
                rng.gen_bool(self.fail_rate),
                rng.gen_bool(0.5),
            )
        };
        tokio::time::sleep(self.latency / 2 + Duration::from_millis(jitter_ms / 2)).await;

        let to = parameters
            .get("to")
            .and_then(|v| v.as_str())
            .unwrap_or("<missing>");
        if roll {
            tracing::debug!(%template_id, to, "simulated failure");
            if transport {
                return Err(DeliveryError::Transport("simulated connection reset".to_string()));
            }
            return Ok(false);
        }
        tracing::debug!(%template_id, to, "simulated send");
        Ok(true)
    }
}
