//! Classification of failed probe attempts.

use serde::{Deserialize, Serialize};

/// Why a probe attempt failed.
///
/// Only [`FailureKind::FeatureUnsupported`] is a capability signal; every
/// other kind is treated as "unknown" by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No HTTP status: timeout, connection failure or cancellation.
    Transport,
    /// 401 or 403.
    Auth,
    /// 400 whose message matched a schema rule.
    FeatureUnsupported,
    /// Anything else.
    Unclassified,
}

impl FailureKind {
    /// Classify from an HTTP status and an optional schema-rule match.
    pub fn from_status(status: u16, schema_match: bool) -> Self {
        match status {
            0 => Self::Transport,
            401 | 403 => Self::Auth,
            400 if schema_match => Self::FeatureUnsupported,
            _ => Self::Unclassified,
        }
    }

    /// Whether another attempt of the same request could succeed.
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::FeatureUnsupported)
    }
}
