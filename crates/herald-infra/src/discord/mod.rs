//! Discord REST adapter.

pub mod client;
pub mod commands;
pub mod render;
pub mod types;

pub use client::DiscordClient;
