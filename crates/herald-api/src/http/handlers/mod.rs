//! HTTP request handlers.

pub mod category;
pub mod health;
pub mod interaction;
