//! Endpoint resolution for probe requests.

use super::key::{ProviderFamily, ProviderKey};
use crate::error::{ProbeError, Result};

const CHAT_COMPLETIONS: &str = "/chat/completions";
const MESSAGES: &str = "/messages";

/// Default base URL for hosted providers; `None` for self-hosted ones.
pub const fn default_base_url(provider: ProviderKey) -> Option<&'static str> {
    match provider {
        ProviderKey::OpenAi => Some("https://api.openai.com/v1"),
        ProviderKey::Anthropic => Some("https://api.anthropic.com/v1"),
        ProviderKey::Google => Some("https://generativelanguage.googleapis.com/v1beta"),
        ProviderKey::OpenRouter => Some("https://openrouter.ai/api/v1"),
        ProviderKey::Groq => Some("https://api.groq.com/openai/v1"),
        ProviderKey::Mistral => Some("https://api.mistral.ai/v1"),
        ProviderKey::Grok => Some("https://api.x.ai/v1"),
        ProviderKey::Together => Some("https://api.together.xyz/v1"),
        ProviderKey::DeepSeek => Some("https://api.deepseek.com/v1"),
        ProviderKey::Ollama
        | ProviderKey::LmStudio
        | ProviderKey::Vllm
        | ProviderKey::OpenAiCompatible => None,
    }
}

/// Resolve the full request URL for `provider`.
///
/// A custom endpoint may be a bare host (`http://localhost:11434`), a
/// versioned base (`.../v1`) or the full endpoint; the expected path is
/// appended only when missing, so resolving an already-resolved URL is a
/// no-op. Self-hosted providers fail without a custom endpoint.
pub fn provider_endpoint(
    provider: ProviderKey,
    model: &str,
    custom_endpoint: Option<&str>,
) -> Result<String> {
    let custom = custom_endpoint
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty());

    let base = match (custom, default_base_url(provider)) {
        (Some(custom), _) => custom.trim_end_matches('/'),
        (None, Some(default)) => default,
        (None, None) => return Err(ProbeError::MissingEndpoint(provider.to_string())),
    };

    Ok(match provider.family() {
        ProviderFamily::OpenAi => append_versioned(base, CHAT_COMPLETIONS),
        ProviderFamily::Anthropic => append_versioned(base, MESSAGES),
        ProviderFamily::Gemini => gemini_endpoint(base, model),
    })
}

fn append_versioned(base: &str, path: &str) -> String {
    if base.ends_with(path) {
        base.to_string()
    } else if has_version_suffix(base) {
        format!("{base}{path}")
    } else {
        format!("{base}/v1{path}")
    }
}

fn has_version_suffix(base: &str) -> bool {
    base.rsplit('/')
        .next()
        .and_then(|segment| segment.strip_prefix('v'))
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn gemini_endpoint(base: &str, model: &str) -> String {
    if base.contains(":generateContent") {
        return base.to_string();
    }
    let model = model.strip_prefix("models/").unwrap_or(model);
    if base.ends_with("/models") {
        format!("{base}/{model}:generateContent")
    } else {
        format!("{base}/models/{model}:generateContent")
    }
}
