//! Probe Client, variant search and orchestration.

pub mod client;
pub mod prober;
pub mod request;
pub mod result;
pub mod retry;
pub mod transport;
pub mod variants;

pub use client::{
    classify_response, detect_schema_error, is_feature_not_supported_error, make_probe_request,
    parse_probe_error, ParsedProbeError,
};
pub use prober::{ProbeOutcome, ProbeTarget, Prober};
pub use request::{ProbeRequestSpec, ProbeResponse};
pub use result::{
    ModelProbeResult, ProbeAttemptResult, RetrySeries, SubProbeResult, VariantOutcome,
    PROBE_VERSION,
};
pub use retry::{execute_probe_with_retry, Backoff, RetryPolicy};
pub use transport::{HttpTransport, ReqwestTransport, ScriptedReply, ScriptedTransport};
pub use variants::{default_image_variants, default_pdf_variants, run_variant_search, MediaVariant};
