//! CLI command handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{CapsArgs, OverrideCommands, ProbeArgs};
use crate::cache::{canonical_provider, parse_cache_key, CapabilityCache, FileCacheStore};
use crate::capabilities::{summarize_probe_result, CapabilityPatch};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::probe::{ProbeTarget, Prober};
use crate::provider::ProviderKey;

/// Shared state every command starts from.
pub struct CliContext {
    pub config: ProbeConfig,
    pub cache: CapabilityCache,
}

impl CliContext {
    /// Load config (file or env) and open the cache file.
    pub fn load(config_path: Option<PathBuf>, cache_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ProbeConfig::load(&path)?,
            None => ProbeConfig::from_env(),
        };
        let store = match cache_path {
            Some(path) => FileCacheStore::new(path),
            None => FileCacheStore::new_default(),
        };
        tracing::debug!(path = %store.path().display(), "Opening capability cache");
        let cache = CapabilityCache::load_from_store(Arc::new(store))?;
        Ok(Self { config, cache })
    }
}

/// Split `provider:model` and resolve the provider.
pub fn parse_target(raw: &str) -> Result<(ProviderKey, String)> {
    let key = parse_cache_key(raw)?;
    let provider: ProviderKey = key.provider.parse()?;
    if key.model.is_empty() {
        return Err(ProbeError::InvalidCacheKey(raw.to_string()));
    }
    Ok((provider, key.model))
}

/// Canonical provider name for cache lookups; unknown names pass through.
fn canonical_key(raw: &str) -> Result<(String, String)> {
    let key = parse_cache_key(raw)?;
    Ok((canonical_provider(&key.provider).into_owned(), key.model))
}

/// Handle `modelprobe probe`.
pub async fn handle_probe(ctx: CliContext, args: ProbeArgs) -> Result<()> {
    let mut config = ctx.config;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency.max(1);
    }

    let max_age = args
        .max_age_hours
        .map(|hours| Duration::from_secs(hours.saturating_mul(3600)));

    let mut targets = Vec::with_capacity(args.models.len());
    for raw in &args.models {
        let (provider, model) = parse_target(raw)?;
        if let Some(max_age) = max_age {
            if !ctx.cache.needs_probe(provider.as_str(), &model, max_age) {
                println!("{provider}:{model}  fresh, skipped");
                continue;
            }
        }
        targets.push(ProbeTarget {
            provider,
            model,
            api_key: args.api_key.clone(),
            endpoint: args.endpoint.clone(),
        });
    }
    if targets.is_empty() {
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight probes");
            on_interrupt.cancel();
        }
    });

    let prober = Prober::with_reqwest(config)?;
    let outcomes = prober.probe_many(targets, &ctx.cache, &cancel).await;

    let mut failures = 0usize;
    for outcome in outcomes {
        let label = format!("{}:{}", outcome.target.provider, outcome.target.model);
        match outcome.result {
            Ok(result) => {
                let summary = summarize_probe_result(&result);
                println!(
                    "{label}  text={} vision={} pdf={} ({} ms)",
                    if summary.success { "ok" } else { "failed" },
                    summary.vision,
                    summary.pdf,
                    result.total_probe_time_ms
                );
                for issue in &summary.issues {
                    println!("    {issue}");
                }
            }
            Err(err) => {
                failures += 1;
                println!("{label}  error: {err}");
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }
    if failures > 0 {
        tracing::warn!(failures, "Some targets could not be probed");
    }
    Ok(())
}

/// Handle `modelprobe caps`.
pub fn handle_caps(ctx: &CliContext, args: &CapsArgs) -> Result<()> {
    let (provider, model) = canonical_key(&args.model)?;
    let caps = ctx.cache.get_capabilities(&provider, &model);
    let source = ctx.cache.get_capability_source(&provider, &model);
    println!("{}", serde_json::to_string_pretty(&caps)?);
    println!("source: {source}");
    if let Some(entry) = ctx.cache.get_probed_entry(&provider, &model) {
        println!("probed at: {}", entry.probed_at.to_rfc3339());
    }
    Ok(())
}

/// Handle `modelprobe stats`.
pub fn handle_stats(ctx: &CliContext) -> Result<()> {
    let stats = ctx.cache.get_cache_stats();
    println!("models: {}", stats.model_count);
    if let (Some(oldest), Some(newest)) = (stats.oldest_entry, stats.newest_entry) {
        println!("oldest: {}", oldest.to_rfc3339());
        println!("newest: {}", newest.to_rfc3339());
    }
    for (provider, count) in &stats.provider_breakdown {
        println!("  {provider}: {count}");
    }
    Ok(())
}

/// Handle `modelprobe override ...`.
pub fn handle_override(ctx: &CliContext, command: OverrideCommands) -> Result<()> {
    match command {
        OverrideCommands::Set(args) => {
            let (provider, model) = canonical_key(&args.model)?;
            let patch: CapabilityPatch = serde_json::from_str(&args.patch)?;
            ctx.cache.set_local_override(&provider, &model, patch)?;
            println!("Override saved for {provider}:{model}");
        }
        OverrideCommands::Remove(args) => {
            let (provider, model) = canonical_key(&args.model)?;
            if ctx.cache.remove_local_override(&provider, &model)? {
                println!("Override removed for {provider}:{model}");
            } else {
                println!("No override for {provider}:{model}");
            }
        }
        OverrideCommands::Clear => {
            ctx.cache.clear_local_overrides()?;
            println!("All overrides cleared");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_target_resolves_aliases() {
        let (provider, model) = parse_target("gemini:gemini-1.5-pro").unwrap();
        assert_eq!(provider, ProviderKey::Google);
        assert_eq!(model, "gemini-1.5-pro");
    }

    #[test]
    fn parse_target_keeps_model_colons() {
        let (provider, model) = parse_target("ollama:llava:13b").unwrap();
        assert_eq!(provider, ProviderKey::Ollama);
        assert_eq!(model, "llava:13b");
    }

    #[test]
    fn parse_target_rejects_unknown_provider() {
        assert!(matches!(
            parse_target("nope:model"),
            Err(ProbeError::UnknownProvider(_))
        ));
        assert!(parse_target("openai:").is_err());
    }

    #[test]
    fn override_commands_write_through() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let ctx = CliContext::load(None, Some(path.clone())).unwrap();
        handle_override(
            &ctx,
            OverrideCommands::Set(super::super::OverrideSetArgs {
                model: "xai:grok-2".to_string(),
                patch: r#"{"supportsVision": true}"#.to_string(),
            }),
        )
        .unwrap();

        let reopened = CliContext::load(None, Some(path)).unwrap();
        let patch = reopened.cache.local_override("grok", "grok-2").unwrap();
        assert_eq!(patch.supports_vision, Some(true));
    }

    #[test]
    fn empty_override_patch_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = CliContext::load(None, Some(dir.path().join("cache.json"))).unwrap();
        let err = handle_override(
            &ctx,
            OverrideCommands::Set(super::super::OverrideSetArgs {
                model: "openai:gpt-4o".to_string(),
                patch: r#"{"unknownField": true}"#.to_string(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::Configuration(_)));
        assert_eq!(ctx.cache.local_override("openai", "gpt-4o"), None);
    }
}
