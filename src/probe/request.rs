//! Uniform request and response envelopes for one probe exchange.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

pub const STATUS_TEXT_TIMEOUT: &str = "Timeout";
pub const STATUS_TEXT_CANCELLED: &str = "Cancelled";

/// Stateless prototype of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct ProbeRequestSpec {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ProbeRequestSpec {
    pub fn post(url: impl Into<String>, headers: HeaderMap, body: Value) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            headers,
            body,
        }
    }
}

/// What came back, or a `status == 0` stand-in when nothing did.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
    /// Best-effort parse of `body`; `None` when it is not JSON.
    pub body_json: Option<Value>,
}

impl ProbeResponse {
    /// Build from raw parts, parsing the body as JSON when possible.
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        let body_json = serde_json::from_str(&body).ok();
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body,
            body_json,
        }
    }

    /// Shorthand for a JSON body with the canonical reason phrase.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, reason_phrase(status), HeaderMap::new(), body.to_string())
    }

    pub fn timeout() -> Self {
        Self::no_status(STATUS_TEXT_TIMEOUT)
    }

    pub fn cancelled() -> Self {
        Self::no_status(STATUS_TEXT_CANCELLED)
    }

    pub fn transport_error(message: &str) -> Self {
        Self::no_status(format!("Network error: {message}"))
    }

    fn no_status(status_text: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: status_text.into(),
            headers: HeaderMap::new(),
            body: String::new(),
            body_json: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_timeout(&self) -> bool {
        self.status == 0 && self.status_text == STATUS_TEXT_TIMEOUT
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == 0 && self.status_text == STATUS_TEXT_CANCELLED
    }
}

pub(crate) fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
