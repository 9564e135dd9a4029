//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use modelprobe::capabilities::ProbedCapabilities;
use modelprobe::probe::{ModelProbeResult, ProbeAttemptResult, SubProbeResult, PROBE_VERSION};
use modelprobe::provider::ProviderKey;

/// A committed-looking probe result with the given capabilities.
pub fn probe_result(
    provider: ProviderKey,
    model: &str,
    capabilities: ProbedCapabilities,
    probed_at: DateTime<Utc>,
) -> ModelProbeResult {
    ModelProbeResult {
        provider: provider.to_string(),
        model: model.to_string(),
        probed_at,
        text_probe: ProbeAttemptResult::succeeded(200),
        image_probe: SubProbeResult::skipped("not run"),
        pdf_probe: SubProbeResult::skipped("not run"),
        capabilities,
        probe_version: PROBE_VERSION,
        total_probe_time_ms: 1,
    }
}
