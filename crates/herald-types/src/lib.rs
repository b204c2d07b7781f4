//! Shared domain types for Herald.
//!
//! This crate contains the types passed between the workflow core and its
//! adapters: notification categories, workflow keys and instances, prompts,
//! inbound actions, configuration, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod notification;
pub mod prompt;
pub mod workflow;
