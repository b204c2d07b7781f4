//! Workflow lifecycle: store, step sequencing, confirmation, and the engine
//! that drives them from inbound actions.

pub mod engine;
pub mod gate;
pub mod sequencer;
pub mod store;

pub use engine::NotificationEngine;
pub use store::{WorkflowStore, spawn_sweeper};
