//! Probe configuration (layered: defaults < TOML file < environment).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};
use crate::probe::retry::{Backoff, RetryPolicy};
use crate::probe::variants::{default_image_variants, default_pdf_variants, MediaVariant};
use crate::provider::ProviderKey;

pub const DEFAULT_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/4/47/PNG_transparency_demonstration_1.png";
pub const DEFAULT_PDF_URL: &str =
    "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf";

/// Knobs for the probing process. Production traffic retry policy is not
/// configured here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Hard deadline per HTTP attempt.
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub backoff: Backoff,
    pub stop_on_unsupported: bool,
    /// Models probed at once by `Prober::probe_many`.
    pub concurrency: usize,
    pub max_tokens: u32,
    pub text_prompt: String,
    pub media_prompt: String,
    pub pdf_prompt: String,
    /// Remote image used by non-base64 variants.
    pub image_url: String,
    /// Remote PDF used by non-base64 variants.
    pub pdf_url: String,
    pub image_variants: Vec<MediaVariant>,
    pub pdf_variants: Vec<MediaVariant>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            retry_delay_ms: 1_000,
            backoff: Backoff::Fixed,
            stop_on_unsupported: true,
            concurrency: 4,
            max_tokens: 16,
            text_prompt: "Reply with the single word OK.".to_string(),
            media_prompt: "Describe the attached image in one word.".to_string(),
            pdf_prompt: "What word does the attached document contain?".to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            pdf_url: DEFAULT_PDF_URL.to_string(),
            image_variants: default_image_variants(),
            pdf_variants: default_pdf_variants(),
        }
    }
}

impl ProbeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `MODELPROBE_*` overrides (after loading `.env` if present).
    /// Unparseable values and a zero timeout are ignored.
    pub fn apply_env(&mut self) {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        if let Some(v) = env_parse::<u64>("MODELPROBE_TIMEOUT_MS").filter(|v| *v > 0) {
            self.timeout_ms = v;
        }
        if let Some(v) = env_parse("MODELPROBE_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = env_parse("MODELPROBE_RETRY_DELAY_MS") {
            self.retry_delay_ms = v;
        }
        if let Some(v) = env_parse::<usize>("MODELPROBE_CONCURRENCY") {
            self.concurrency = v.max(1);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ProbeError::Configuration("timeout_ms must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(ProbeError::Configuration("concurrency must be at least 1".into()));
        }
        if self.image_variants.is_empty() || self.pdf_variants.is_empty() {
            return Err(ProbeError::Configuration(
                "variant lists must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
            backoff: self.backoff,
            stop_on_unsupported: self.stop_on_unsupported,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Environment variables holding each provider's API key, in lookup order.
pub const fn api_key_env_vars(provider: ProviderKey) -> &'static [&'static str] {
    match provider {
        ProviderKey::OpenAi => &["OPENAI_API_KEY"],
        ProviderKey::Anthropic => &["ANTHROPIC_API_KEY"],
        ProviderKey::Google => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        ProviderKey::OpenRouter => &["OPENROUTER_API_KEY"],
        ProviderKey::Groq => &["GROQ_API_KEY"],
        ProviderKey::Mistral => &["MISTRAL_API_KEY"],
        ProviderKey::Grok => &["XAI_API_KEY", "GROK_API_KEY"],
        ProviderKey::Together => &["TOGETHER_API_KEY"],
        ProviderKey::DeepSeek => &["DEEPSEEK_API_KEY"],
        ProviderKey::OpenAiCompatible => &["OPENAI_COMPAT_API_KEY"],
        ProviderKey::Ollama | ProviderKey::LmStudio | ProviderKey::Vllm => &[],
    }
}

/// Default API key for `provider` from the environment. Empty values
/// count as absent.
pub fn api_key_from_env(provider: ProviderKey) -> Option<String> {
    api_key_env_vars(provider)
        .iter()
        .find_map(|name| env_non_empty(name))
}

/// Default endpoint for a self-hosted provider from the environment.
pub fn endpoint_from_env(provider: ProviderKey) -> Option<String> {
    let name = match provider {
        ProviderKey::Ollama => "OLLAMA_BASE_URL",
        ProviderKey::LmStudio => "LMSTUDIO_BASE_URL",
        ProviderKey::Vllm => "VLLM_BASE_URL",
        ProviderKey::OpenAiCompatible => "OPENAI_COMPAT_BASE_URL",
        _ => return None,
    };
    env_non_empty(name)
}
