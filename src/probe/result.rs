//! Records produced by probing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::variants::MediaVariant;
use crate::capabilities::ProbedCapabilities;
use crate::error::FailureKind;

/// Bumped whenever probe requests change enough to invalidate old results.
pub const PROBE_VERSION: u32 = 1;

/// One classified outcome of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeAttemptResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP status; 0 when no response arrived.
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Label of the schema rule that matched, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_error: Option<String>,
}

impl ProbeAttemptResult {
    pub fn succeeded(status: u16) -> Self {
        Self {
            success: true,
            error_code: None,
            error_message: None,
            status,
            failure: None,
            schema_error: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: None,
            error_message: Some(message.into()),
            status: 0,
            failure: Some(kind),
            schema_error: None,
        }
    }

    /// A definitive "this feature is absent" signal.
    pub fn is_feature_unsupported(&self) -> bool {
        self.failure == Some(FailureKind::FeatureUnsupported)
    }
}

/// Bounded attempt sequence for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySeries {
    pub final_success: bool,
    pub results: Vec<ProbeAttemptResult>,
}

impl RetrySeries {
    /// The attempt that decided the series.
    pub fn last_result(&self) -> Option<&ProbeAttemptResult> {
        self.results.last()
    }

    pub fn attempts(&self) -> usize {
        self.results.len()
    }
}

/// One variant and the series it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOutcome {
    pub variant: MediaVariant,
    pub series: RetrySeries,
}

/// Aggregate across all variants tried for one dimension (image or PDF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProbeResult {
    /// Decisive attempt of the first variant tried.
    pub primary_result: ProbeAttemptResult,
    pub final_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_variant: Option<MediaVariant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tried: Vec<VariantOutcome>,
}

impl SubProbeResult {
    /// Aggregate tried variants. `final_success` holds iff some series
    /// succeeded; the first successful variant is recorded.
    pub fn from_outcomes(tried: Vec<VariantOutcome>) -> Self {
        let primary_result = tried
            .first()
            .and_then(|outcome| outcome.series.last_result().cloned())
            .unwrap_or_else(|| {
                ProbeAttemptResult::failed(FailureKind::Unclassified, "No variants attempted")
            });
        let successful_variant = tried
            .iter()
            .find(|outcome| outcome.series.final_success)
            .map(|outcome| outcome.variant);

        Self {
            primary_result,
            final_success: successful_variant.is_some(),
            successful_variant,
            tried,
        }
    }

    /// A dimension that was not attempted.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            primary_result: ProbeAttemptResult::failed(FailureKind::Unclassified, reason),
            final_success: false,
            successful_variant: None,
            tried: Vec::new(),
        }
    }
}

/// Immutable record of one full probing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProbeResult {
    pub provider: String,
    pub model: String,
    pub probed_at: DateTime<Utc>,
    pub text_probe: ProbeAttemptResult,
    pub image_probe: SubProbeResult,
    pub pdf_probe: SubProbeResult,
    pub capabilities: ProbedCapabilities,
    pub probe_version: u32,
    pub total_probe_time_ms: u64,
}
