//! Tests for configuration loading and environment lookup.

use std::sync::{Mutex, OnceLock};

use modelprobe::config::{api_key_from_env, endpoint_from_env, ProbeConfig};
use modelprobe::provider::ProviderKey;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 10] = [
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
    "GOOGLE_API_KEY",
    "XAI_API_KEY",
    "OLLAMA_BASE_URL",
    "OPENAI_COMPAT_BASE_URL",
    "MODELPROBE_TIMEOUT_MS",
    "MODELPROBE_MAX_RETRIES",
    "MODELPROBE_RETRY_DELAY_MS",
    "MODELPROBE_CONCURRENCY",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_env() {
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
}

#[test]
fn api_keys_come_from_provider_variables() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("OPENAI_API_KEY", "sk-env");
    std::env::set_var("XAI_API_KEY", "xai-env");
    assert_eq!(api_key_from_env(ProviderKey::OpenAi).as_deref(), Some("sk-env"));
    assert_eq!(api_key_from_env(ProviderKey::Grok).as_deref(), Some("xai-env"));
    assert_eq!(api_key_from_env(ProviderKey::Ollama), None);
}

#[test]
fn gemini_key_is_preferred_over_google_key() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("GOOGLE_API_KEY", "google");
    assert_eq!(api_key_from_env(ProviderKey::Google).as_deref(), Some("google"));
    std::env::set_var("GEMINI_API_KEY", "gemini");
    assert_eq!(api_key_from_env(ProviderKey::Google).as_deref(), Some("gemini"));
}

#[test]
fn empty_values_count_as_absent() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("OPENAI_API_KEY", "  ");
    std::env::set_var("OLLAMA_BASE_URL", "");
    assert_eq!(api_key_from_env(ProviderKey::OpenAi), None);
    assert_eq!(endpoint_from_env(ProviderKey::Ollama), None);
}

#[test]
fn self_hosted_endpoints_come_from_base_url_variables() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("OLLAMA_BASE_URL", "http://gpu-box:11434");
    std::env::set_var("OPENAI_COMPAT_BASE_URL", "http://proxy.internal/v1");
    assert_eq!(
        endpoint_from_env(ProviderKey::Ollama).as_deref(),
        Some("http://gpu-box:11434")
    );
    assert_eq!(
        endpoint_from_env(ProviderKey::OpenAiCompatible).as_deref(),
        Some("http://proxy.internal/v1")
    );
    assert_eq!(endpoint_from_env(ProviderKey::OpenAi), None);
}

#[test]
fn env_overrides_probe_knobs() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("MODELPROBE_TIMEOUT_MS", "2500");
    std::env::set_var("MODELPROBE_MAX_RETRIES", "0");
    std::env::set_var("MODELPROBE_RETRY_DELAY_MS", "not-a-number");
    std::env::set_var("MODELPROBE_CONCURRENCY", "0");

    let config = ProbeConfig::from_env();
    assert_eq!(config.timeout_ms, 2500);
    assert_eq!(config.max_retries, 0);
    assert_eq!(config.retry_delay_ms, 1000);
    assert_eq!(config.concurrency, 1);
}

#[test]
fn zero_timeout_from_env_is_ignored() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    std::env::set_var("MODELPROBE_TIMEOUT_MS", "0");
    let config = ProbeConfig::from_env();
    assert_eq!(config.timeout_ms, 30_000);
    assert!(config.validate().is_ok());

    let mut layered = ProbeConfig {
        timeout_ms: 4_000,
        ..ProbeConfig::default()
    };
    layered.apply_env();
    assert_eq!(layered.timeout_ms, 4_000);
}

#[test]
fn file_then_env_layering() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_env();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("probe.toml");
    std::fs::write(
        &path,
        r#"
        timeout_ms = 9000
        max_retries = 4
        image_url = "https://example.com/cat.png"
        "#,
    )
    .unwrap();
    std::env::set_var("MODELPROBE_MAX_RETRIES", "1");

    let config = ProbeConfig::load(&path).unwrap();
    assert_eq!(config.timeout_ms, 9000);
    assert_eq!(config.max_retries, 1);
    assert_eq!(config.image_url, "https://example.com/cat.png");
}

#[test]
fn missing_config_file_is_io_error() {
    let err = ProbeConfig::load(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, modelprobe::error::ProbeError::Io(_)));
}
