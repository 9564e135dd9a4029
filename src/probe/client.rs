//! Probe Client: one deadline-bounded exchange plus error classification.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::request::{ProbeRequestSpec, ProbeResponse};
use super::result::ProbeAttemptResult;
use super::transport::HttpTransport;
use crate::error::FailureKind;
use crate::util::{with_deadline, Deadline};

/// Issue `spec` with a hard deadline.
///
/// Never fails: a missed deadline yields `{status: 0, statusText: "Timeout"}`,
/// cancellation yields `"Cancelled"` and transport errors yield a
/// `"Network error: .."` stand-in.
pub async fn make_probe_request(
    transport: &dyn HttpTransport,
    spec: &ProbeRequestSpec,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ProbeResponse {
    match with_deadline(timeout, cancel, transport.send(spec)).await {
        Deadline::Completed(Ok(response)) => response,
        Deadline::Completed(Err(err)) => {
            debug!(url = %spec.url, error = %err, "Probe transport failed");
            ProbeResponse::transport_error(&err.to_string())
        }
        Deadline::TimedOut => {
            debug!(url = %spec.url, timeout_ms = timeout.as_millis() as u64, "Probe timed out");
            ProbeResponse::timeout()
        }
        Deadline::Cancelled => ProbeResponse::cancelled(),
    }
}

/// Error code and message pulled out of a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProbeError {
    pub error_code: Option<String>,
    pub error_message: String,
}

/// Extract code and message from an error body.
///
/// Tries the OpenAI envelope (`error.code` / `error.message`), then the
/// Anthropic envelope (`type: "error"` with `error.type` / `error.message`),
/// then bare string forms, and finally falls back to the status text.
pub fn parse_probe_error(response: &ProbeResponse) -> ParsedProbeError {
    let body = response.body_json.as_ref();

    if let Some(parsed) = body.and_then(openai_envelope) {
        return parsed;
    }
    if let Some(parsed) = body.and_then(anthropic_envelope) {
        return parsed;
    }
    if let Some(message) = body.and_then(bare_message) {
        return ParsedProbeError {
            error_code: None,
            error_message: message,
        };
    }

    let error_message = if response.status_text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        response.status_text.clone()
    };
    ParsedProbeError {
        error_code: None,
        error_message,
    }
}

fn openai_envelope(body: &Value) -> Option<ParsedProbeError> {
    let error = body.get("error")?.as_object()?;
    let message = error.get("message")?.as_str()?;
    let code = error
        .get("code")
        .and_then(value_as_code)
        .or_else(|| error.get("status").and_then(value_as_code))
        .or_else(|| error.get("type").and_then(value_as_code));
    Some(ParsedProbeError {
        error_code: code,
        error_message: message.to_string(),
    })
}

fn anthropic_envelope(body: &Value) -> Option<ParsedProbeError> {
    if body.get("type")?.as_str()? != "error" {
        return None;
    }
    let error = body.get("error");
    let code = error.and_then(|e| e.get("type")).and_then(value_as_code);
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| code.clone())
        .unwrap_or_else(|| "Unknown error".to_string());
    Some(ParsedProbeError {
        error_code: code,
        error_message: message,
    })
}

/// `{"error": "..."}`, `{"message": "..."}` or `{"detail": "..."}`.
fn bare_message(body: &Value) -> Option<String> {
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn value_as_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ordered `(predicate, label)` rule over a lowercased error message.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRule {
    pub label: &'static str,
    pub predicate: fn(&str) -> bool,
    /// The model lacks the feature outright, as opposed to wanting a
    /// different encoding of it.
    pub absence: bool,
}

pub const INVALID_CONTENT_TYPE: &str = "Invalid content type";
pub const VISION_NOT_SUPPORTED: &str = "Vision not supported";
pub const BASE64_REQUIRED: &str = "Base64 encoding required";
pub const PDF_NOT_SUPPORTED: &str = "PDF not supported";

fn contains_any(message: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| message.contains(needle))
}

static SCHEMA_RULES: [SchemaRule; 4] = [
    SchemaRule {
        label: INVALID_CONTENT_TYPE,
        absence: true,
        predicate: |m: &str| {
            contains_any(
                m,
                &[
                    "content type",
                    "content-type",
                    "content_type",
                    "unsupported content",
                    "invalid content part",
                    "mime type",
                ],
            )
        },
    },
    SchemaRule {
        label: VISION_NOT_SUPPORTED,
        absence: true,
        predicate: |m: &str| {
            contains_any(
                m,
                &[
                    "vision",
                    "does not support image",
                    "image input is not supported",
                    "images are not supported",
                    "image_url is only supported",
                    "not a multimodal",
                    "does not support multimodal",
                ],
            )
        },
    },
    SchemaRule {
        label: BASE64_REQUIRED,
        absence: false,
        predicate: |m: &str| {
            contains_any(
                m,
                &[
                    "base64",
                    "data url",
                    "url is not supported",
                    "urls are not supported",
                    "remote image",
                    "failed to download",
                ],
            )
        },
    },
    SchemaRule {
        label: PDF_NOT_SUPPORTED,
        absence: true,
        predicate: |m: &str| {
            contains_any(
                m,
                &[
                    "pdf",
                    "document input",
                    "file input",
                    "does not support file",
                    "unsupported file",
                ],
            )
        },
    },
];

/// The rules `detect_schema_error` applies, in order.
pub fn schema_rules() -> &'static [SchemaRule] {
    &SCHEMA_RULES
}

/// First rule label matching `message`, case-insensitively.
pub fn detect_schema_error_in(message: &str) -> Option<&'static str> {
    match_schema_rule(message).map(|rule| rule.label)
}

fn match_schema_rule(message: &str) -> Option<&'static SchemaRule> {
    let lowered = message.to_lowercase();
    schema_rules()
        .iter()
        .find(|rule| (rule.predicate)(&lowered))
}

/// Schema-rule label for a response's error message, or `None` when the
/// cause is unknown.
pub fn detect_schema_error(response: &ProbeResponse) -> Option<&'static str> {
    detect_schema_error_in(&parse_probe_error(response).error_message)
}

/// True only for HTTP 400 responses that matched a feature-absence rule.
///
/// "Invalid content type" counts as absence: providers use it to reject a
/// part kind the model cannot take at all. "Base64 encoding required" does
/// not; the model still takes the media, just not by URL, so URL variants
/// keep their retry budget.
pub fn is_feature_not_supported_error(response: &ProbeResponse) -> bool {
    response.status == 400
        && match_schema_rule(&parse_probe_error(response).error_message)
            .is_some_and(|rule| rule.absence)
}

/// Turn a response into a classified attempt.
///
/// A 2xx carrying an `error` object (some routers do this) is a failure.
pub fn classify_response(response: &ProbeResponse) -> ProbeAttemptResult {
    let embedded_error = response
        .body_json
        .as_ref()
        .and_then(|body| body.get("error"))
        .is_some_and(|error| error.is_object());

    if response.is_success() && !embedded_error {
        return ProbeAttemptResult::succeeded(response.status);
    }

    let parsed = parse_probe_error(response);
    let rule = if response.status == 0 {
        None
    } else {
        match_schema_rule(&parsed.error_message)
    };
    let failure = FailureKind::from_status(response.status, rule.is_some_and(|r| r.absence));

    ProbeAttemptResult {
        success: false,
        error_code: parsed.error_code,
        error_message: Some(parsed.error_message),
        status: response.status,
        failure: Some(failure),
        schema_error: rule.map(|r| r.label.to_string()),
    }
}
