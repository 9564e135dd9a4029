//! Encoding variants and the search that tries them in order.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::result::{ProbeAttemptResult, SubProbeResult, VariantOutcome};
use super::retry::RetryPolicy;

/// One request-encoding strategy for a media dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVariant {
    pub use_base64: bool,
    pub images_first: bool,
    /// PDF only: send the rendered page as an image instead of the file.
    #[serde(default, skip_serializing_if = "is_false")]
    pub as_pdf_images: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl MediaVariant {
    pub const fn new(use_base64: bool, images_first: bool) -> Self {
        Self {
            use_base64,
            images_first,
            as_pdf_images: false,
        }
    }

    pub const fn pdf_as_images(use_base64: bool, images_first: bool) -> Self {
        Self {
            use_base64,
            images_first,
            as_pdf_images: true,
        }
    }
}

/// Inline before remote, text-first before media-first.
pub fn default_image_variants() -> Vec<MediaVariant> {
    vec![
        MediaVariant::new(true, false),
        MediaVariant::new(true, true),
        MediaVariant::new(false, false),
        MediaVariant::new(false, true),
    ]
}

/// Native PDF in both orders, then the rendered-page fallback.
pub fn default_pdf_variants() -> Vec<MediaVariant> {
    vec![
        MediaVariant::new(true, false),
        MediaVariant::new(true, true),
        MediaVariant::pdf_as_images(true, false),
    ]
}

/// Try `variants` in order, one fully retried series at a time, stopping
/// at the first variant whose series succeeds. Every configured variant is
/// tried before giving up; cancellation stops between variants.
pub async fn run_variant_search<F, Fut>(
    dimension: &str,
    variants: &[MediaVariant],
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> SubProbeResult
where
    F: FnMut(MediaVariant) -> Fut,
    Fut: Future<Output = ProbeAttemptResult>,
{
    let mut tried = Vec::with_capacity(variants.len());

    for &variant in variants {
        if cancel.is_cancelled() {
            break;
        }
        let series = policy.run(cancel, || attempt(variant)).await;
        let succeeded = series.final_success;
        debug!(
            dimension,
            use_base64 = variant.use_base64,
            images_first = variant.images_first,
            as_pdf_images = variant.as_pdf_images,
            attempts = series.attempts(),
            succeeded,
            "Variant finished"
        );
        tried.push(VariantOutcome { variant, series });
        if succeeded {
            break;
        }
    }

    SubProbeResult::from_outcomes(tried)
}
