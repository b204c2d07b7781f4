//! Infrastructure layer for Herald.
//!
//! Implements the adapter ports defined in `herald-core`: the Discord REST
//! client (channel directory, channel and direct-message delivery, slash
//! command registration) and a dry-run platform that only logs. Also loads
//! `herald.toml` and the environment into a `HeraldConfig`.

pub mod config;
pub mod discord;
pub mod dry_run;
pub mod platform;
