//! Derive a capability vector from a completed probe run.

use super::ProbedCapabilities;
use crate::probe::SubProbeResult;
use crate::provider::ProviderKey;

/// Capability vector implied by the image and PDF sub-probes.
///
/// Shapes come from the provider family; they are not probed.
pub fn infer_capabilities(
    provider: ProviderKey,
    image_probe: &SubProbeResult,
    pdf_probe: &SubProbeResult,
) -> ProbedCapabilities {
    let family = provider.family();
    let image_variant = image_probe.successful_variant;
    let pdf_via_images = pdf_probe
        .successful_variant
        .is_some_and(|variant| variant.as_pdf_images);

    ProbedCapabilities {
        supports_vision: image_probe.final_success,
        supports_pdf_native: pdf_probe.final_success && !pdf_via_images,
        supports_pdf_as_images: pdf_probe.final_success,
        requires_base64_images: image_variant.map_or(true, |v| v.use_base64),
        requires_images_first: image_variant.is_some_and(|v| v.images_first),
        message_shape: family.message_shape(),
        completion_shape: family.completion_shape(),
    }
}
