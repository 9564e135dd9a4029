//! Known per-model capabilities that differ from the provider baseline.

use std::sync::OnceLock;

use regex::Regex;

use super::CapabilityPatch;
use crate::provider::ProviderKey;

struct StaticRule {
    /// Empty matches any provider.
    providers: &'static [ProviderKey],
    model: Regex,
    patch: CapabilityPatch,
}

const LOCAL: &[ProviderKey] = &[
    ProviderKey::Ollama,
    ProviderKey::LmStudio,
    ProviderKey::Vllm,
    ProviderKey::OpenAiCompatible,
];

static RULES: OnceLock<Vec<StaticRule>> = OnceLock::new();

const fn flags(vision: bool, pdf_native: bool, pdf_images: bool) -> CapabilityPatch {
    CapabilityPatch {
        supports_vision: Some(vision),
        supports_pdf_native: Some(pdf_native),
        supports_pdf_as_images: Some(pdf_images),
        requires_base64_images: None,
        requires_images_first: None,
        message_shape: None,
        completion_shape: None,
    }
}

fn rule(providers: &'static [ProviderKey], pattern: &str, patch: CapabilityPatch) -> StaticRule {
    StaticRule {
        providers,
        model: Regex::new(&format!("(?i){pattern}")).expect("static override pattern"),
        patch,
    }
}

fn rules() -> &'static [StaticRule] {
    RULES.get_or_init(|| {
        use ProviderKey::*;

        let text_only = flags(false, false, false);
        let vision_only = flags(true, false, true);
        let full = flags(true, true, true);
        let local_vision = CapabilityPatch {
            requires_base64_images: Some(true),
            ..vision_only
        };

        vec![
            // Ordered most specific first; the first match wins.
            rule(&[OpenAi], r"^gpt-4o(-|$)", full),
            rule(&[OpenAi], r"^(gpt-4\.1|gpt-5|o1|o3|o4)(-|$)", full),
            rule(&[OpenAi], r"^gpt-4-turbo", vision_only),
            rule(&[OpenAi], r"^(gpt-3\.5|gpt-4$|gpt-4-\d{4})", text_only),
            rule(&[Anthropic], r"^claude-3-(5|7)-", full),
            rule(&[Anthropic], r"^claude-(opus|sonnet|haiku)-4", full),
            rule(&[Anthropic], r"^claude-3-", vision_only),
            rule(&[Anthropic], r"^claude-(2|instant)", text_only),
            rule(&[Google], r"^(models/)?gemini-", full),
            rule(&[OpenRouter], r"^openai/gpt-4o", vision_only),
            rule(&[OpenRouter], r"^anthropic/claude-(3|opus|sonnet|haiku)", vision_only),
            rule(&[OpenRouter], r"^google/gemini-", vision_only),
            rule(&[Groq], r"llama-3\.2-\d+b-vision|llama-4", vision_only),
            rule(&[Mistral], r"^pixtral|^mistral-(small|medium)-(2503|latest)", vision_only),
            rule(&[Grok], r"vision|^grok-4", vision_only),
            rule(&[DeepSeek], r".", text_only),
            rule(
                LOCAL,
                r"llava|bakllava|moondream|minicpm-v|vision|[-_.]vl\b|qwen2\.5vl|gemma3",
                local_vision,
            ),
        ]
    })
}

/// Known override for `model` on `provider`, or `None`.
pub fn static_override(provider: &str, model: &str) -> Option<CapabilityPatch> {
    let provider = ProviderKey::parse(provider)?;
    rules()
        .iter()
        .find(|rule| {
            (rule.providers.is_empty() || rule.providers.contains(&provider))
                && rule.model.is_match(model)
        })
        .map(|rule| rule.patch)
}
