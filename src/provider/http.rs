//! Auth and attribution headers per provider.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::key::{ProviderFamily, ProviderKey};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const ATTRIBUTION_REFERER: &str = "https://crates.io/crates/modelprobe";
const ATTRIBUTION_TITLE: &str = "modelprobe";

/// Build the header set for one probe request.
///
/// `Content-Type: application/json` is always present. Self-hosted
/// providers never carry auth, even when a key is passed.
pub fn provider_headers(provider: ProviderKey, api_key: Option<&str>) -> HeaderMap {
    let key = api_key.filter(|k| !k.is_empty() && !provider.is_self_hosted());
    let mut headers = match (provider.family(), key) {
        (ProviderFamily::Anthropic, Some(k)) => anthropic_headers(k, ANTHROPIC_VERSION),
        (ProviderFamily::Anthropic, None) => {
            let mut headers = json_headers();
            headers.insert(
                "anthropic-version",
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
            headers
        }
        (ProviderFamily::Gemini, Some(k)) => google_headers(k),
        (ProviderFamily::OpenAi, Some(k)) => bearer_headers(k),
        (_, None) => json_headers(),
    };

    if provider == ProviderKey::OpenRouter {
        headers.insert("HTTP-Referer", HeaderValue::from_static(ATTRIBUTION_REFERER));
        headers.insert("X-Title", HeaderValue::from_static(ATTRIBUTION_TITLE));
    }
    headers
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = json_headers();
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Build Anthropic-style headers (x-api-key).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = json_headers();
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

fn google_headers(api_key: &str) -> HeaderMap {
    let mut headers = json_headers();
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-goog-api-key", val);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn openai_uses_bearer() {
        let headers = provider_headers(ProviderKey::OpenAi, Some("sk-test"));
        assert_eq!(get(&headers, "authorization"), Some("Bearer sk-test"));
        assert_eq!(get(&headers, "content-type"), Some("application/json"));
    }

    #[test]
    fn anthropic_uses_api_key_and_version() {
        let headers = provider_headers(ProviderKey::Anthropic, Some("ant-key"));
        assert_eq!(get(&headers, "x-api-key"), Some("ant-key"));
        assert_eq!(get(&headers, "anthropic-version"), Some(ANTHROPIC_VERSION));
        assert!(headers.get("authorization").is_none());
    }

    #[test]
    fn openrouter_adds_attribution() {
        let headers = provider_headers(ProviderKey::OpenRouter, Some("or-key"));
        assert_eq!(get(&headers, "authorization"), Some("Bearer or-key"));
        assert_eq!(get(&headers, "x-title"), Some(ATTRIBUTION_TITLE));
        assert!(headers.contains_key("http-referer"));
    }

    #[test]
    fn local_providers_never_send_auth() {
        let headers = provider_headers(ProviderKey::Ollama, Some("ignored"));
        assert!(headers.get("authorization").is_none());
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn google_uses_goog_header() {
        let headers = provider_headers(ProviderKey::Google, Some("g-key"));
        assert_eq!(get(&headers, "x-goog-api-key"), Some("g-key"));
    }
}
