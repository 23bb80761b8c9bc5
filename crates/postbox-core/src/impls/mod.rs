//! Impls - implementations of the ports.
//!
//! The production delivery (a transactional email API client) lives outside this crate.

pub mod event_sink;
pub mod fn_delivery;

pub use self::event_sink::{NoopEventSink, RecordingEventSink, TracingEventSink};
pub use self::fn_delivery::FnDelivery;
