//! Fake delivery capability for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use postbox_core::{DeliveryError, EmailDelivery, EmailQueue, Parameters, RetryPolicy, TemplateId};
use tokio::sync::{Semaphore, watch};

/// What one delivery call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    /// `Ok(false)`
    Fail,
    /// `Err(Transport)`
    Error,
    Panic,
    /// Never resolves.
    Hang,
    /// Succeeds once `open_gate` hands out a permit.
    Gated,
    /// Reports failure once `open_gate` hands out a permit.
    GatedFail,
}

/// Per-template scripted responses, falling back to `fallback` when a script runs out.
pub struct ScriptedDelivery {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Step,
    calls: Mutex<Vec<String>>,
    count_tx: watch::Sender<usize>,
    gate: Semaphore,
}

impl ScriptedDelivery {
    pub fn new(fallback: Step) -> Arc<Self> {
        let (count_tx, _) = watch::channel(0);
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
            count_tx,
            gate: Semaphore::new(0),
        })
    }

    pub fn script(&self, template_id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(template_id.to_string())
            .or_default()
            .extend(steps);
    }

    /// Template ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, template_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == template_id)
            .count()
    }

    pub fn call_count(&self) -> usize {
        *self.count_tx.borrow()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.count_tx.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|count| *count >= n))
            .await
            .expect("timed out waiting for delivery calls")
            .expect("call counter dropped");
    }

    pub fn open_gate(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl EmailDelivery for ScriptedDelivery {
    async fn deliver(
        &self,
        template_id: &TemplateId,
        _parameters: &Parameters,
    ) -> Result<bool, DeliveryError> {
        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .get_mut(template_id.as_str())
                .and_then(VecDeque::pop_front)
                .unwrap_or(self.fallback)
        };
        self.calls.lock().unwrap().push(template_id.to_string());
        self.count_tx.send_modify(|count| *count += 1);

        match step {
            Step::Succeed => Ok(true),
            Step::Fail => Ok(false),
            Step::Error => Err(DeliveryError::Transport("smtp relay unavailable".to_string())),
            Step::Panic => panic!("malformed parameters for {template_id}"),
            Step::Hang => std::future::pending().await,
            Step::Gated | Step::GatedFail => {
                self.gate.acquire().await.expect("gate closed").forget();
                Ok(step == Step::Gated)
            }
        }
    }
}

/// Queue with no timeout and immediate retries, logging to a no-op sink.
pub fn queue_with(delivery: Arc<ScriptedDelivery>, concurrency: usize) -> EmailQueue {
    EmailQueue::builder(delivery)
        .concurrency(concurrency)
        .attempt_timeout(None)
        .retry_policy(RetryPolicy::immediate())
        .event_sink(Arc::new(postbox_core::impls::NoopEventSink))
        .build()
        .expect("valid queue config")
}

pub fn params(to: &str) -> Parameters {
    let mut p = Parameters::new();
    p.insert("to".to_string(), serde_json::json!(to));
    p
}
