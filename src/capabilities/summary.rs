//! Human-readable digest of a probe run.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::probe::{ModelProbeResult, ProbeAttemptResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisionSupport {
    Yes,
    /// Works only with media before text.
    Partial,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PdfSupport {
    Native,
    Images,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub success: bool,
    pub vision: VisionSupport,
    pub pdf: PdfSupport,
    /// Plain-language problems: text, then image, then PDF.
    pub issues: Vec<String>,
}

/// Summarize a run for users.
pub fn summarize_probe_result(result: &ModelProbeResult) -> ProbeSummary {
    let caps = &result.capabilities;

    let vision = match (caps.supports_vision, caps.requires_images_first) {
        (true, false) => VisionSupport::Yes,
        (true, true) => VisionSupport::Partial,
        (false, _) => VisionSupport::No,
    };
    let pdf = if caps.supports_pdf_native {
        PdfSupport::Native
    } else if caps.supports_pdf_as_images {
        PdfSupport::Images
    } else {
        PdfSupport::No
    };

    let issues = [
        ("Text", &result.text_probe),
        ("Image", &result.image_probe.primary_result),
        ("PDF", &result.pdf_probe.primary_result),
    ]
    .into_iter()
    .filter(|(_, attempt)| !attempt.success)
    .map(|(label, attempt)| describe_issue(label, attempt))
    .collect();

    ProbeSummary {
        success: result.text_probe.success,
        vision,
        pdf,
        issues,
    }
}

fn describe_issue(label: &str, attempt: &ProbeAttemptResult) -> String {
    let message = attempt.error_message.as_deref().unwrap_or("unknown error");
    match attempt.schema_error.as_deref() {
        Some(schema) if schema != message => format!("{label}: {schema} ({message})"),
        _ => format!("{label}: {message}"),
    }
}
