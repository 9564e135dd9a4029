//! Typed provider identifiers and alias handling.

use std::fmt;
use std::str::FromStr;

use crate::capabilities::{CompletionShape, MessageShape};
use crate::error::ProbeError;

/// Canonical provider keys used for endpoint, header and body selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKey {
    OpenAi,
    Anthropic,
    Google,
    OpenRouter,
    Groq,
    Mistral,
    Grok,
    Together,
    DeepSeek,
    Ollama,
    LmStudio,
    Vllm,
    OpenAiCompatible,
}

/// Wire family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    /// `/chat/completions` with `image_url` and `file` parts.
    OpenAi,
    /// `/v1/messages` with `image` and `document` blocks.
    Anthropic,
    /// `generateContent` with `inline_data` parts.
    Gemini,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 13] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Google,
        Self::OpenRouter,
        Self::Groq,
        Self::Mistral,
        Self::Grok,
        Self::Together,
        Self::DeepSeek,
        Self::Ollama,
        Self::LmStudio,
        Self::Vllm,
        Self::OpenAiCompatible,
    ];

    /// Canonical provider key string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::Grok => "grok",
            Self::Together => "together",
            Self::DeepSeek => "deepseek",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
            Self::Vllm => "vllm",
            Self::OpenAiCompatible => "openai-compatible",
        }
    }

    /// Parse user-facing provider aliases into a typed provider key.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "google" | "gemini" => Some(Self::Google),
            "openrouter" => Some(Self::OpenRouter),
            "groq" => Some(Self::Groq),
            "mistral" => Some(Self::Mistral),
            "grok" | "xai" => Some(Self::Grok),
            "together" => Some(Self::Together),
            "deepseek" => Some(Self::DeepSeek),
            "ollama" => Some(Self::Ollama),
            "lmstudio" | "lm-studio" => Some(Self::LmStudio),
            "vllm" => Some(Self::Vllm),
            "openai-compatible" | "openai_compatible" | "local-openai-compatible" => {
                Some(Self::OpenAiCompatible)
            }
            _ => None,
        }
    }

    pub const fn family(self) -> ProviderFamily {
        match self {
            Self::Anthropic => ProviderFamily::Anthropic,
            Self::Google => ProviderFamily::Gemini,
            _ => ProviderFamily::OpenAi,
        }
    }

    /// Self-hosted providers run wherever the user put them.
    pub const fn is_self_hosted(self) -> bool {
        matches!(
            self,
            Self::Ollama | Self::LmStudio | Self::Vllm | Self::OpenAiCompatible
        )
    }

    /// Hosted cloud providers need a key; self-hosted ones do not.
    pub const fn requires_api_key(self) -> bool {
        !self.is_self_hosted()
    }

    /// Self-hosted providers have no well-known base URL.
    pub const fn requires_endpoint(self) -> bool {
        self.is_self_hosted()
    }
}

impl ProviderFamily {
    pub const fn message_shape(self) -> MessageShape {
        match self {
            Self::OpenAi => MessageShape::OpenAiParts,
            Self::Anthropic => MessageShape::AnthropicContent,
            Self::Gemini => MessageShape::GeminiParts,
        }
    }

    pub const fn completion_shape(self) -> CompletionShape {
        match self {
            Self::OpenAi => CompletionShape::OpenAiStreaming,
            Self::Anthropic => CompletionShape::AnthropicStreaming,
            Self::Gemini => CompletionShape::GeminiStreaming,
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKey {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ProbeError::UnknownProvider(s.to_string()))
    }
}

/// Whether a provider name needs an API key. Unknown providers are
/// assumed to be hosted.
pub fn provider_requires_api_key(provider: &str) -> bool {
    ProviderKey::parse(provider).map_or(true, ProviderKey::requires_api_key)
}

/// Whether a provider name needs a caller-supplied endpoint.
pub fn provider_requires_endpoint(provider: &str) -> bool {
    ProviderKey::parse(provider).is_some_and(ProviderKey::requires_endpoint)
}
