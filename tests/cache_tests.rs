//! Tests for layered capability resolution and the cache file.

mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use modelprobe::cache::{
    make_cache_key, parse_cache_key, CacheFile, CacheStore, CapabilityCache, CapabilitySource,
    FileCacheStore,
};
use modelprobe::capabilities::{
    provider_defaults, CapabilityPatch, MessageShape, ProbedCapabilities,
};
use modelprobe::error::ProbeError;
use modelprobe::provider::ProviderKey;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::probe_result;

fn vision(value: bool) -> CapabilityPatch {
    CapabilityPatch {
        supports_vision: Some(value),
        ..Default::default()
    }
}

#[test]
fn empty_tiers_resolve_to_provider_defaults() {
    let cache = CapabilityCache::new();
    for (provider, model) in [
        ("together", "meta-llama/Llama-3-70b-chat-hf"),
        ("anthropic", "some-future-model"),
        ("not-a-provider", "whatever"),
    ] {
        assert_eq!(
            cache.get_capabilities(provider, model),
            provider_defaults(provider),
            "{provider}:{model}"
        );
        assert_eq!(
            cache.get_capability_source(provider, model),
            CapabilitySource::ProviderDefault
        );
    }
}

#[test]
fn gpt_4o_vision_comes_from_static_tier() {
    let cache = CapabilityCache::new();
    assert!(cache.get_capabilities("openai", "gpt-4o").supports_vision);
    assert_eq!(
        cache.get_capability_source("openai", "gpt-4o"),
        CapabilitySource::StaticOverride
    );
}

#[test]
fn probed_tier_beats_static_and_keeps_lower_fields() {
    let cache = CapabilityCache::new();
    let measured = ProbedCapabilities {
        supports_vision: false,
        supports_pdf_native: false,
        supports_pdf_as_images: false,
        ..provider_defaults("openai")
    };
    cache
        .update_from_probe_result(&probe_result(ProviderKey::OpenAi, "gpt-4o", measured, Utc::now()))
        .unwrap();

    let caps = cache.get_capabilities("openai", "gpt-4o");
    assert!(!caps.supports_vision);
    assert_eq!(caps.message_shape, MessageShape::OpenAiParts);
    assert!(!caps.requires_base64_images);
    assert_eq!(
        cache.get_capability_source("openai", "gpt-4o"),
        CapabilitySource::Probed
    );
}

#[test]
fn probed_tier_does_not_override_shapes() {
    let cache = CapabilityCache::new();
    // A result carrying the conservative OpenAI shapes for an Anthropic model.
    let measured = ProbedCapabilities {
        supports_vision: true,
        ..ProbedCapabilities::default()
    };
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::Anthropic,
            "claude-3-opus-20240229",
            measured,
            Utc::now(),
        ))
        .unwrap();
    let caps = cache.get_capabilities("anthropic", "claude-3-opus-20240229");
    assert_eq!(caps.message_shape, MessageShape::AnthropicContent);
}

#[test]
fn newer_probe_replaces_older_entry() {
    let cache = CapabilityCache::new();
    let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
    let on = ProbedCapabilities {
        supports_vision: true,
        ..Default::default()
    };
    let off = ProbedCapabilities::default();

    cache
        .update_from_probe_result(&probe_result(ProviderKey::Groq, "llama", on, first))
        .unwrap();
    cache
        .update_from_probe_result(&probe_result(ProviderKey::Groq, "llama", off, second))
        .unwrap();

    let entry = cache.get_probed_entry("groq", "llama").unwrap();
    assert_eq!(entry.probed_at, second);
    assert!(!cache.get_capabilities("groq", "llama").supports_vision);
    assert_eq!(cache.get_cache_stats().model_count, 1);
}

#[test]
fn local_override_wins_and_removal_restores_probed() {
    let cache = CapabilityCache::new();
    let measured = ProbedCapabilities {
        supports_vision: false,
        ..provider_defaults("openai")
    };
    cache
        .update_from_probe_result(&probe_result(ProviderKey::OpenAi, "gpt-4o", measured, Utc::now()))
        .unwrap();

    cache
        .set_local_override("openai", "gpt-4o", vision(true))
        .unwrap();
    assert_eq!(
        cache.get_capability_source("openai", "gpt-4o"),
        CapabilitySource::LocalOverride
    );
    assert!(cache.get_capabilities("openai", "gpt-4o").supports_vision);

    assert!(cache.remove_local_override("openai", "gpt-4o").unwrap());
    assert_eq!(
        cache.get_capability_source("openai", "gpt-4o"),
        CapabilitySource::Probed
    );
    assert!(!cache.get_capabilities("openai", "gpt-4o").supports_vision);
    assert!(!cache.remove_local_override("openai", "gpt-4o").unwrap());
}

#[test]
fn partial_override_keeps_sibling_fields() {
    let cache = CapabilityCache::new();
    cache
        .set_local_override(
            "ollama",
            "llava:13b",
            CapabilityPatch {
                requires_images_first: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    let caps = cache.get_capabilities("ollama", "llava:13b");
    assert!(caps.requires_images_first);
    // From the local vision rule.
    assert!(caps.supports_vision);
    assert!(caps.requires_base64_images);
}

#[test]
fn clearing_overrides_leaves_probed_tier() {
    let cache = CapabilityCache::new();
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::Mistral,
            "pixtral-large",
            ProbedCapabilities::default(),
            Utc::now(),
        ))
        .unwrap();
    cache
        .set_local_override("mistral", "pixtral-large", vision(true))
        .unwrap();
    cache
        .set_local_override("groq", "llama", vision(true))
        .unwrap();

    cache.clear_local_overrides().unwrap();
    assert!(cache.local_override("groq", "llama").is_none());
    assert_eq!(
        cache.get_capability_source("mistral", "pixtral-large"),
        CapabilitySource::Probed
    );
}

#[test]
fn cache_keys_round_trip_awkward_models() {
    for model in [
        "anthropic/claude-3:latest",
        "llava:13b",
        "meta-llama/Llama-3.2-11B-Vision-Instruct",
        "a:b:c/d",
        "",
    ] {
        let key = make_cache_key("openrouter", model);
        let parsed = parse_cache_key(&key).unwrap();
        assert_eq!(parsed.provider, "openrouter");
        assert_eq!(parsed.model, model);
    }
}

#[test]
fn stats_cover_probed_tier_only() {
    let cache = CapabilityCache::new();
    let older = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    let newer = Utc.with_ymd_and_hms(2026, 3, 5, 17, 30, 0).unwrap();
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::OpenAi,
            "gpt-4o",
            ProbedCapabilities::default(),
            newer,
        ))
        .unwrap();
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::Anthropic,
            "claude-3-opus",
            ProbedCapabilities::default(),
            older,
        ))
        .unwrap();
    cache
        .set_local_override("groq", "llama", vision(true))
        .unwrap();

    let stats = cache.get_cache_stats();
    assert_eq!(stats.model_count, 2);
    assert_eq!(stats.oldest_entry, Some(older));
    assert_eq!(stats.newest_entry, Some(newer));
    assert_eq!(stats.provider_breakdown.len(), 2);
    assert_eq!(stats.provider_breakdown["openai"], 1);
    assert_eq!(stats.provider_breakdown["anthropic"], 1);
}

#[test]
fn empty_cache_stats() {
    let stats = CapabilityCache::new().get_cache_stats();
    assert_eq!(stats.model_count, 0);
    assert!(stats.oldest_entry.is_none());
    assert!(stats.newest_entry.is_none());
}

#[test]
fn file_store_persists_both_tiers() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileCacheStore::new(dir.path().join("capability-cache.json")));
    let probed_at = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();

    let cache = CapabilityCache::load_from_store(store.clone()).unwrap();
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::Ollama,
            "llava:13b",
            ProbedCapabilities {
                supports_vision: true,
                ..Default::default()
            },
            probed_at,
        ))
        .unwrap();
    cache
        .set_local_override("openai", "gpt-4o", vision(false))
        .unwrap();

    let reopened = CapabilityCache::load_from_store(store.clone()).unwrap();
    assert_eq!(
        reopened.get_probed_entry("ollama", "llava:13b").unwrap().probed_at,
        probed_at
    );
    assert_eq!(reopened.local_override("openai", "gpt-4o"), Some(vision(false)));
    assert_eq!(reopened.snapshot(), cache.snapshot());

    let file = store.load().unwrap().unwrap();
    assert!(file.models.contains_key("ollama:llava:13b"));
}

#[test]
fn file_store_reads_camel_case_documents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(
        &path,
        r#"{
            "version": 1,
            "models": {
                "openrouter:anthropic/claude-3:latest": {
                    "capabilities": {"supportsVision": true, "requiresImagesFirst": true},
                    "probedAt": "2026-02-10T09:00:00Z"
                }
            },
            "localOverrides": {
                "groq:llama": {"supportsPdfAsImages": true}
            }
        }"#,
    )
    .unwrap();

    let cache = CapabilityCache::load_from_store(Arc::new(FileCacheStore::new(path))).unwrap();
    let caps = cache.get_capabilities("openrouter", "anthropic/claude-3:latest");
    assert!(caps.supports_vision);
    assert!(caps.requires_images_first);
    assert!(cache.get_capabilities("groq", "llama").supports_pdf_as_images);
}

/// Records every save; the first one stalls to widen the race window.
#[derive(Default)]
struct SlowRecordingStore {
    saves: Mutex<Vec<CacheFile>>,
}

impl CacheStore for SlowRecordingStore {
    fn load(&self) -> modelprobe::error::Result<Option<CacheFile>> {
        Ok(None)
    }

    fn save(&self, file: &CacheFile) -> modelprobe::error::Result<()> {
        let first = self.saves.lock().unwrap().is_empty();
        if first {
            thread::sleep(Duration::from_millis(300));
        }
        self.saves.lock().unwrap().push(file.clone());
        Ok(())
    }
}

#[test]
fn concurrent_commits_persist_in_order() {
    let store = Arc::new(SlowRecordingStore::default());
    let cache = CapabilityCache::with_store(store.clone());
    let probed_at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();

    let first = {
        let cache = cache.clone();
        thread::spawn(move || {
            cache
                .update_from_probe_result(&probe_result(
                    ProviderKey::OpenAi,
                    "a",
                    ProbedCapabilities::default(),
                    probed_at,
                ))
                .unwrap();
        })
    };
    thread::sleep(Duration::from_millis(50));
    let second = {
        let cache = cache.clone();
        thread::spawn(move || {
            cache
                .update_from_probe_result(&probe_result(
                    ProviderKey::OpenAi,
                    "b",
                    ProbedCapabilities::default(),
                    probed_at,
                ))
                .unwrap();
        })
    };
    first.join().unwrap();
    second.join().unwrap();

    let saves = store.saves.lock().unwrap();
    assert_eq!(saves.len(), 2);
    let last = saves.last().unwrap();
    assert_eq!(last.models.len(), 2);
    assert!(last.models.contains_key("openai:a"));
    assert!(last.models.contains_key("openai:b"));
}

#[test]
fn file_store_survives_parallel_saves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capability-cache.json");
    let cache = CapabilityCache::with_store(Arc::new(FileCacheStore::new(path.clone())));
    let probed_at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            thread::spawn(move || {
                cache
                    .update_from_probe_result(&probe_result(
                        ProviderKey::Ollama,
                        &format!("model-{i}"),
                        ProbedCapabilities::default(),
                        probed_at,
                    ))
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let on_disk = FileCacheStore::new(path).load().unwrap().unwrap();
    assert_eq!(on_disk.models.len(), 8);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn provider_aliases_share_tiers() {
    let cache = CapabilityCache::new();
    cache
        .update_from_probe_result(&probe_result(
            ProviderKey::Google,
            "gemini-1.5-pro",
            ProbedCapabilities {
                supports_vision: false,
                ..Default::default()
            },
            Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
        ))
        .unwrap();

    assert!(!cache.get_capabilities("gemini", "gemini-1.5-pro").supports_vision);
    assert_eq!(
        cache.get_capability_source("gemini", "gemini-1.5-pro"),
        CapabilitySource::Probed
    );
    assert!(cache.get_probed_entry("gemini", "gemini-1.5-pro").is_some());

    cache.set_local_override("xai", "grok-2", vision(true)).unwrap();
    assert_eq!(
        cache.get_capability_source("grok", "grok-2"),
        CapabilitySource::LocalOverride
    );
    assert!(cache.remove_local_override("GROK", "grok-2").unwrap());
    assert_eq!(cache.local_override("xai", "grok-2"), None);

    // Unknown providers keep their own spelling.
    cache
        .set_local_override("my-proxy", "m", vision(true))
        .unwrap();
    assert!(cache.local_override("my-proxy", "m").is_some());
}

#[test]
fn aliased_keys_in_cache_file_are_folded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(
        &path,
        r#"{
            "version": 1,
            "models": {
                "gemini:gemini-1.5-flash": {
                    "capabilities": {"supportsVision": false},
                    "probedAt": "2026-02-10T09:00:00Z"
                }
            }
        }"#,
    )
    .unwrap();

    let cache = CapabilityCache::load_from_store(Arc::new(FileCacheStore::new(path))).unwrap();
    assert_eq!(
        cache.get_capability_source("google", "gemini-1.5-flash"),
        CapabilitySource::Probed
    );
    assert!(cache.snapshot().models.contains_key("google:gemini-1.5-flash"));
}

#[test]
fn empty_override_is_rejected() {
    let cache = CapabilityCache::new();
    let err = cache
        .set_local_override("openai", "gpt-4o", CapabilityPatch::default())
        .unwrap_err();
    assert!(matches!(err, ProbeError::Configuration(_)));
    assert_eq!(
        cache.get_capability_source("openai", "gpt-4o"),
        CapabilitySource::StaticOverride
    );
    assert_eq!(cache.local_override("openai", "gpt-4o"), None);
}
