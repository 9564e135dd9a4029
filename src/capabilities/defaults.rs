//! Baseline capability vector per provider.

use super::{default_capabilities, ProbedCapabilities};
use crate::provider::ProviderKey;

/// Full baseline vector for a provider name. Unknown providers get the
/// conservative default.
pub fn provider_defaults(provider: &str) -> ProbedCapabilities {
    ProviderKey::parse(provider).map_or_else(default_capabilities, defaults_for)
}

/// Baseline for a known provider.
pub fn defaults_for(provider: ProviderKey) -> ProbedCapabilities {
    let family = provider.family();
    let base = ProbedCapabilities {
        message_shape: family.message_shape(),
        completion_shape: family.completion_shape(),
        ..default_capabilities()
    };

    match provider {
        ProviderKey::OpenAi => ProbedCapabilities {
            supports_vision: true,
            supports_pdf_native: true,
            supports_pdf_as_images: true,
            requires_base64_images: false,
            ..base
        },
        ProviderKey::Anthropic | ProviderKey::Google => ProbedCapabilities {
            supports_vision: true,
            supports_pdf_native: true,
            supports_pdf_as_images: true,
            ..base
        },
        // Routers and open-weight hosts vary per model; static overrides
        // and probes fill in the multimodal bits.
        ProviderKey::OpenRouter
        | ProviderKey::Groq
        | ProviderKey::Mistral
        | ProviderKey::Grok
        | ProviderKey::Together
        | ProviderKey::DeepSeek
        | ProviderKey::Ollama
        | ProviderKey::LmStudio
        | ProviderKey::Vllm
        | ProviderKey::OpenAiCompatible => base,
    }
}
