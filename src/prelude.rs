//! Convenience re-exports for common use.

pub use crate::cache::{CapabilityCache, CapabilitySource, CacheStats, FileCacheStore};
pub use crate::capabilities::{
    summarize_probe_result, CapabilityPatch, ProbeSummary, ProbedCapabilities,
};
pub use crate::config::ProbeConfig;
pub use crate::error::{ProbeError, Result};
pub use crate::probe::{ModelProbeResult, ProbeTarget, Prober, RetryPolicy};
pub use crate::provider::ProviderKey;
