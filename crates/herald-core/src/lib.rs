//! Workflow orchestration core for Herald.
//!
//! This crate owns the notification workflow: the transient instance store,
//! step sequencing, the confirmation gate, and dispatch fan-out. It defines
//! the "ports" (adapter traits) that `herald-infra` and `herald-api`
//! implement, and depends only on `herald-types` -- never on any network or
//! platform crate.

pub mod adapter;
pub mod clock;
pub mod dispatch;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
