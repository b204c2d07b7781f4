//! HTTP interaction endpoint for Herald.
//!
//! Axum API at `/api/v1/` with the envelope response format and CORS
//! support. Platform gateways post user actions here and render the
//! returned prompt.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
