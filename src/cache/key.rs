//! `"<provider>:<model>"` cache keys.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ProbeError, Result};
use crate::provider::ProviderKey;

/// Parsed cache key. The model keeps any further `:` or `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub provider: String,
    pub model: String,
}

pub fn make_cache_key(provider: &str, model: &str) -> String {
    format!("{provider}:{model}")
}

/// Canonical name for a known provider (`gemini` becomes `google`).
/// Unknown names pass through unchanged.
pub fn canonical_provider(provider: &str) -> Cow<'_, str> {
    match ProviderKey::parse(provider) {
        Some(key) => Cow::Borrowed(key.as_str()),
        None => Cow::Borrowed(provider),
    }
}

/// Cache key with the provider in canonical form.
pub fn canonical_cache_key(provider: &str, model: &str) -> String {
    make_cache_key(&canonical_provider(provider), model)
}

/// Re-key a stored `"<provider>:<model>"` under its canonical provider.
/// Malformed keys are returned as-is.
pub(crate) fn canonicalize_key(key: String) -> String {
    match parse_cache_key(&key) {
        Ok(parsed) => canonical_cache_key(&parsed.provider, &parsed.model),
        Err(_) => key,
    }
}

/// Split on the first colon only, so `openrouter:anthropic/claude-3:latest`
/// keeps `anthropic/claude-3:latest` as the model.
pub fn parse_cache_key(key: &str) -> Result<CacheKey> {
    match key.split_once(':') {
        Some((provider, model)) if !provider.is_empty() => Ok(CacheKey {
            provider: provider.to_string(),
            model: model.to_string(),
        }),
        _ => Err(ProbeError::InvalidCacheKey(key.to_string())),
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}
