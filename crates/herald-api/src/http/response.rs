//! JSON envelope shared by every endpoint.
//!
//! Successful responses carry `data`, failed ones carry `errors`; both carry
//! `meta` (request id, timestamp, latency) and may carry `_links`.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: Meta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub request_id: String,
    pub timestamp: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    /// Stable, machine-readable code such as `FORBIDDEN`.
    pub code: &'static str,
    pub message: String,
}

/// Started when a handler begins; stamps the envelope when it ends.
pub struct RequestTimer {
    id: uuid::Uuid,
    started: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            started: Instant::now(),
        }
    }

    pub fn meta(&self) -> Meta {
        Meta {
            request_id: self.id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, timer: &RequestTimer) -> Self {
        Self {
            data: Some(data),
            meta: timer.meta(),
            errors: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn link(mut self, rel: &'static str, href: &'static str) -> Self {
        self.links.insert(rel, href);
        self
    }
}

impl Envelope<()> {
    pub fn failure(code: &'static str, message: impl Into<String>, timer: &RequestTimer) -> Self {
        Self {
            data: None,
            meta: timer.meta(),
            errors: vec![ErrorEntry {
                code,
                message: message.into(),
            }],
            links: BTreeMap::new(),
        }
    }
}
