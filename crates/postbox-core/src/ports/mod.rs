//! Ports - the queue's collaborators.
//!
//! - **EmailDelivery**: the external "send one templated email" capability
//! - **EventSink**: observability hook (logs, metrics, alerting)

pub mod delivery;
pub mod event_sink;

pub use self::delivery::EmailDelivery;
pub use self::event_sink::EventSink;
