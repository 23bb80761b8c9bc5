//! Domain model (ids, tasks, outcomes, decisions, events).

pub mod decision;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod task;

pub use decision::{Decider, Decision, DefaultDecider};
pub use events::DispatchEvent;
pub use ids::TaskId;
pub use outcome::DeliveryOutcome;
pub use task::{Parameters, Priority, QueuedTask, TemplateId};
