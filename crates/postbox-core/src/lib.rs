//! postbox-core
//!
//! In-process email dispatch queue: priority ordering, bounded concurrency,
//! per-task retry with a cap.
//!
//! # Modules
//! - **domain**: TaskId, TemplateId, Priority, QueuedTask, DeliveryOutcome, Decision, DispatchEvent
//! - **ports**: EmailDelivery (the external send call), EventSink (observability)
//! - **queue**: EmailQueue, Backlog, RetryPolicy, status views
//! - **impls**: TracingEventSink / RecordingEventSink / FnDelivery
//! - **typed**: EmailTemplate trait
//! - **config**: QueueConfig
//!
//! Nothing is persisted: a process restart loses every pending email.

pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod typed;

pub use config::QueueConfig;
pub use domain::{DeliveryOutcome, DispatchEvent, Parameters, Priority, TaskId, TemplateId};
pub use error::{ConfigError, DeliveryError, PostboxError};
pub use ports::{EmailDelivery, EventSink};
pub use queue::{DeliveryReceipt, DispatchStats, EmailQueue, QueueStatus, RetryPolicy};
pub use typed::EmailTemplate;
