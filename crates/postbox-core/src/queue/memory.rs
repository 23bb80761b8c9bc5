//! In-memory email dispatch queue.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};

use super::{Backlog, DeliveryReceipt, DispatchStats, QueueStatus, RetryPolicy};
use crate::config::QueueConfig;
use crate::domain::{
    Decider, Decision, DefaultDecider, DeliveryOutcome, DispatchEvent, Parameters, Priority,
    QueuedTask, TemplateId,
};
use crate::error::{DeliveryError, PostboxError};
use crate::impls::TracingEventSink;
use crate::ports::{EmailDelivery, EventSink};
use crate::typed::EmailTemplate;

/// A task plus the sender that resolves its receipt.
struct PendingTask {
    task: QueuedTask,
    notify: Option<oneshot::Sender<DeliveryOutcome>>,
}

impl PendingTask {
    fn resolve(&mut self, outcome: DeliveryOutcome) {
        if let Some(tx) = self.notify.take() {
            // receiver dropped = caller chose fire-and-forget
            let _ = tx.send(outcome);
        }
    }
}

struct QueueState {
    backlog: Backlog<PendingTask>,
    in_flight: usize,
    retry_waiting: usize,
    pump_scheduled: bool,
    closed: bool,
    stats: DispatchStats,
}

impl QueueState {
    fn new() -> Self {
        Self {
            backlog: Backlog::new(),
            in_flight: 0,
            retry_waiting: 0,
            pump_scheduled: false,
            closed: false,
            stats: DispatchStats::default(),
        }
    }

    fn is_active(&self) -> bool {
        !self.backlog.is_empty() || self.in_flight > 0 || self.retry_waiting > 0
    }

    fn status(&self) -> QueueStatus {
        QueueStatus {
            queue_length: self.backlog.len(),
            processing: self.is_active(),
            in_flight: self.in_flight,
            retry_waiting: self.retry_waiting,
        }
    }
}

struct Inner {
    state: Mutex<QueueState>,
    config: QueueConfig,
    delivery: Arc<dyn EmailDelivery>,
    decider: Arc<dyn Decider>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    /// `true` while the queue has work.
    active_tx: watch::Sender<bool>,
    closed_tx: watch::Sender<bool>,
}

/// Priority-ordered, bounded-concurrency email dispatch queue.
///
/// # Design
/// - `enqueue` is synchronous and never waits for delivery
/// - at most `config.concurrency` delivery calls are outstanding at once
/// - every finished attempt immediately tries to refill the freed slot
/// - failures (error, `Ok(false)`, panic, timeout) go through the `Decider`
///
/// Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct EmailQueue {
    inner: Arc<Inner>,
}

impl EmailQueue {
    /// Build a queue with the default `DefaultDecider` for `config.retry`.
    ///
    /// Must be called from inside a tokio runtime; dispatch tasks are spawned onto it.
    pub fn new(
        config: QueueConfig,
        delivery: Arc<dyn EmailDelivery>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, PostboxError> {
        let decider = Arc::new(DefaultDecider::new(config.retry.clone()));
        Self::with_decider(config, delivery, sink, decider)
    }

    pub fn with_decider(
        config: QueueConfig,
        delivery: Arc<dyn EmailDelivery>,
        sink: Arc<dyn EventSink>,
        decider: Arc<dyn Decider>,
    ) -> Result<Self, PostboxError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| PostboxError::NoRuntime)?;
        let (active_tx, _) = watch::channel(false);
        let (closed_tx, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::new()),
                config,
                delivery,
                decider,
                sink,
                runtime,
                active_tx,
                closed_tx,
            }),
        })
    }

    pub fn builder(delivery: Arc<dyn EmailDelivery>) -> EmailQueueBuilder {
        EmailQueueBuilder::new(delivery)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Queue one email.
    ///
    /// Fails only on invalid input (`EmptyTemplateId`, `InvalidMaxAttempts`) or
    /// after `shutdown` (`Closed`). Parameter shape is not checked here.
    pub fn enqueue(
        &self,
        template_id: impl Into<String>,
        parameters: Parameters,
        priority: Priority,
        max_attempts: u32,
    ) -> Result<DeliveryReceipt, PostboxError> {
        let template_id = TemplateId::new(template_id)?;
        let task = QueuedTask::new(template_id, parameters, priority, max_attempts)?;
        self.push(task)
    }

    /// `enqueue` with medium priority and the configured default max attempts.
    pub fn enqueue_default(
        &self,
        template_id: impl Into<String>,
        parameters: Parameters,
    ) -> Result<DeliveryReceipt, PostboxError> {
        self.enqueue(
            template_id,
            parameters,
            Priority::Medium,
            self.inner.config.default_max_attempts,
        )
    }

    /// Queue a typed email; its fields become the parameter bag.
    pub fn enqueue_template<T: EmailTemplate>(
        &self,
        email: &T,
        priority: Priority,
    ) -> Result<DeliveryReceipt, PostboxError> {
        let parameters = email.to_parameters()?;
        self.enqueue(
            T::TEMPLATE_ID,
            parameters,
            priority,
            self.inner.config.default_max_attempts,
        )
    }

    fn push(&self, task: QueuedTask) -> Result<DeliveryReceipt, PostboxError> {
        let (tx, rx) = oneshot::channel();
        let receipt = DeliveryReceipt::new(task.id, rx);

        let mut state = self.inner.lock();
        if state.closed {
            return Err(PostboxError::Closed);
        }
        // emitted before the push: once in the backlog, a running pump on
        // another worker can dispatch the task immediately
        self.inner.sink.emit(&DispatchEvent::Enqueued {
            task_id: task.id,
            template_id: task.template_id.clone(),
            priority: task.priority,
        });
        let priority = task.priority;
        state.backlog.push(
            priority,
            PendingTask {
                task,
                notify: Some(tx),
            },
        );
        state.stats.enqueued += 1;
        self.inner.schedule_pump(&mut state);
        self.inner.publish(&state);
        Ok(receipt)
    }

    /// Pure read.
    pub fn status(&self) -> QueueStatus {
        self.inner.lock().status()
    }

    pub fn stats(&self) -> DispatchStats {
        self.inner.lock().stats.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Resolves once nothing is queued, in flight, or waiting to retry.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.active_tx.subscribe();
        // sender lives as long as `inner`, which we hold
        let _ = rx.wait_for(|active| !*active).await;
    }

    /// Stop accepting work.
    ///
    /// Undispatched and backoff-waiting tasks resolve as `Abandoned`. In-flight
    /// attempts finish; a failure after shutdown is not retried.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let drained = state.backlog.drain();
            state.stats.abandoned += drained.len() as u64;
            self.inner.publish(&state);
            drained
        };
        self.inner.closed_tx.send_replace(true);

        if !drained.is_empty() {
            tracing::warn!(count = drained.len(), "email queue shut down with pending tasks");
        }
        for pending in drained {
            self.inner.abandon(pending);
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // state stays consistent between statements, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &QueueState) {
        let active = state.is_active();
        self.active_tx.send_if_modified(|current| {
            if *current != active {
                *current = active;
                true
            } else {
                false
            }
        });
    }

    /// Start a pump on the runtime unless one is already pending.
    ///
    /// Deferred (not inline) so a synchronous burst of enqueues is fully
    /// prioritized before the first pop.
    fn schedule_pump(self: &Arc<Self>, state: &mut QueueState) {
        if state.pump_scheduled {
            return;
        }
        state.pump_scheduled = true;
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            inner.lock().pump_scheduled = false;
            inner.pump();
        });
    }

    /// Fill free concurrency slots from the backlog.
    fn pump(self: &Arc<Self>) {
        let mut batch = Vec::new();
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            while state.in_flight < self.config.concurrency {
                let Some(mut pending) = state.backlog.pop() else {
                    break;
                };
                pending.task.start_attempt();
                state.in_flight += 1;
                batch.push(pending);
            }
            self.publish(&state);
        }

        for pending in batch {
            self.sink.emit(&DispatchEvent::Dispatched {
                task_id: pending.task.id,
                template_id: pending.task.template_id.clone(),
                attempt: pending.task.attempts,
            });
            let inner = Arc::clone(self);
            self.runtime.spawn(async move {
                inner.run_attempt(pending).await;
            });
        }
    }

    async fn run_attempt(self: Arc<Self>, pending: PendingTask) {
        match self.call_delivery(&pending.task).await {
            Ok(()) => self.on_delivered(pending),
            Err(error) => self.on_failed(pending, error),
        }
        // self-re-entering: the slot we just freed is refilled right away
        self.pump();
    }

    /// One delivery call, isolated in its own task so a panic cannot take the
    /// dispatch loop down with it.
    async fn call_delivery(&self, task: &QueuedTask) -> Result<(), DeliveryError> {
        let delivery = Arc::clone(&self.delivery);
        let template_id = task.template_id.clone();
        let parameters = task.parameters.clone();
        let mut handle = self
            .runtime
            .spawn(async move { delivery.deliver(&template_id, &parameters).await });

        let joined = match self.config.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    return Err(DeliveryError::TimedOut(limit));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => Err(DeliveryError::Rejected(
                "delivery capability reported failure".to_string(),
            )),
            Ok(Err(error)) => Err(error),
            Err(join_error) if join_error.is_panic() => Err(DeliveryError::Panicked(
                panic_message(join_error.into_panic()),
            )),
            Err(join_error) => Err(DeliveryError::Transport(format!(
                "delivery task cancelled: {join_error}"
            ))),
        }
    }

    fn on_delivered(&self, mut pending: PendingTask) {
        {
            let mut state = self.lock();
            state.in_flight -= 1;
            state.stats.delivered += 1;
            self.publish(&state);
        }
        self.sink.emit(&DispatchEvent::Delivered {
            task_id: pending.task.id,
            template_id: pending.task.template_id.clone(),
            attempts: pending.task.attempts,
            queued_for: pending.task.queued_for(Utc::now()),
        });
        let attempts = pending.task.attempts;
        pending.resolve(DeliveryOutcome::Delivered { attempts });
    }

    fn on_failed(self: &Arc<Self>, mut pending: PendingTask, error: DeliveryError) {
        pending.task.record_failure(error.to_string());
        let decision = self.decider.decide(&pending.task, &error);

        let mut state = self.lock();
        state.in_flight -= 1;
        if matches!(error, DeliveryError::TimedOut(_)) {
            state.stats.timed_out += 1;
        }

        if state.closed {
            state.stats.abandoned += 1;
            self.publish(&state);
            drop(state);
            self.abandon(pending);
            return;
        }

        match decision {
            Decision::Retry {
                delay,
                priority,
                reason,
            } => {
                state.stats.retried += 1;
                pending.task.priority = priority;
                tracing::debug!(%reason, "retry scheduled");
                self.sink.emit(&DispatchEvent::RetryScheduled {
                    task_id: pending.task.id,
                    template_id: pending.task.template_id.clone(),
                    attempts: pending.task.attempts,
                    max_attempts: pending.task.max_attempts,
                    priority,
                    delay,
                    error: error.to_string(),
                });
                if delay.is_zero() {
                    // back of its tier, behind anything enqueued meanwhile
                    state.backlog.push(priority, pending);
                } else {
                    state.retry_waiting += 1;
                    self.sleep_then_requeue(pending, delay);
                }
                self.publish(&state);
            }
            Decision::MarkDead { reason } => {
                state.stats.exhausted += 1;
                self.publish(&state);
                drop(state);

                tracing::debug!(%reason, "giving up on email");
                let attempts = pending.task.attempts;
                let last_error = error.to_string();
                self.sink.emit(&DispatchEvent::Exhausted {
                    task_id: pending.task.id,
                    template_id: pending.task.template_id.clone(),
                    attempts,
                    error: last_error.clone(),
                    queued_for: pending.task.queued_for(Utc::now()),
                });
                pending.resolve(DeliveryOutcome::Exhausted {
                    attempts,
                    last_error,
                });
            }
        }
    }

    fn sleep_then_requeue(self: &Arc<Self>, pending: PendingTask, delay: Duration) {
        let inner = Arc::clone(self);
        let mut closed_rx = self.closed_tx.subscribe();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = closed_rx.wait_for(|closed| *closed) => {}
            }
            inner.requeue(pending);
        });
    }

    fn requeue(self: &Arc<Self>, pending: PendingTask) {
        {
            let mut state = self.lock();
            state.retry_waiting -= 1;
            if state.closed {
                state.stats.abandoned += 1;
                self.publish(&state);
                drop(state);
                self.abandon(pending);
                return;
            }
            let priority = pending.task.priority;
            state.backlog.push(priority, pending);
            self.publish(&state);
        }
        self.pump();
    }

    /// Resolve a task as `Abandoned`. Caller has already updated the counters.
    fn abandon(&self, mut pending: PendingTask) {
        let attempts = pending.task.attempts;
        self.sink.emit(&DispatchEvent::Abandoned {
            task_id: pending.task.id,
            template_id: pending.task.template_id.clone(),
            attempts,
        });
        pending.resolve(DeliveryOutcome::Abandoned { attempts });
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Builder for `EmailQueue`.
///
/// ```ignore
/// let queue = EmailQueue::builder(Arc::new(my_delivery))
///     .concurrency(5)
///     .retry_policy(RetryPolicy::exponential(Duration::from_secs(1)).with_jitter(0.3))
///     .build()?;
/// ```
pub struct EmailQueueBuilder {
    config: QueueConfig,
    delivery: Arc<dyn EmailDelivery>,
    sink: Option<Arc<dyn EventSink>>,
    decider: Option<Arc<dyn Decider>>,
}

impl EmailQueueBuilder {
    pub fn new(delivery: Arc<dyn EmailDelivery>) -> Self {
        Self {
            config: QueueConfig::default(),
            delivery,
            sink: None,
            decider: None,
        }
    }

    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn default_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.default_max_attempts = max_attempts;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the retry decision logic. `retry_policy` is ignored when set.
    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Defaults to `TracingEventSink` when no sink was given.
    pub fn build(self) -> Result<EmailQueue, PostboxError> {
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingEventSink::new()));
        match self.decider {
            Some(decider) => EmailQueue::with_decider(self.config, self.delivery, sink, decider),
            None => EmailQueue::new(self.config, self.delivery, sink),
        }
    }
}
