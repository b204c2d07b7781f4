//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::{Envelope, RequestTimer};

/// Application-level error that maps to HTTP responses.
///
/// Workflow errors never reach this type: the engine turns them into
/// prompts, which are successful responses.
#[derive(Debug)]
pub enum AppError {
    /// The caller may not act on this workflow.
    Forbidden(String),
    /// Malformed request body.
    Validation(String),
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, detail = message, "request failed");
        } else {
            tracing::debug!(code, detail = message, "request rejected");
        }

        let body = Envelope::failure(code, message, &RequestTimer::start());
        (status, Json(body)).into_response()
    }
}
