//! Layered capability cache.
//!
//! Resolution overlays four partial tiers, lowest precedence first:
//! provider defaults, the static override table, the latest probe result,
//! and user-supplied local overrides. The probed and override maps live
//! behind one lock so concurrent probe completions interleave safely.
//! Known provider aliases are folded to one key, so `gemini` and `google`
//! resolve through the same tiers.

pub mod key;
pub mod store;

pub use key::{canonical_cache_key, canonical_provider, make_cache_key, parse_cache_key, CacheKey};
use key::canonicalize_key;
pub use store::{CacheFile, CacheStore, FileCacheStore, CACHE_FILE_VERSION};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::capabilities::{provider_defaults, static_override, CapabilityPatch, ProbedCapabilities};
use crate::error::{ProbeError, Result};
use crate::probe::ModelProbeResult;

/// Latest probed-tier record for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub capabilities: CapabilityPatch,
    pub probed_at: DateTime<Utc>,
}

/// Precedence tier that supplied a key's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CapabilitySource {
    LocalOverride,
    Probed,
    StaticOverride,
    ProviderDefault,
}

/// Aggregates over the probed tier. Local overrides are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub model_count: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    pub provider_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
struct CacheInner {
    probed: BTreeMap<String, CacheEntry>,
    overrides: BTreeMap<String, CapabilityPatch>,
}

/// Shared, cloneable handle to the probed and local-override tiers.
///
/// Every mutation is written through to the attached [`CacheStore`], if any.
#[derive(Clone, Default)]
pub struct CapabilityCache {
    inner: Arc<RwLock<CacheInner>>,
    store: Option<Arc<dyn CacheStore>>,
    /// Serializes snapshot-and-save so saves land in mutation order.
    persist_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CapabilityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("CapabilityCache")
            .field("probed", &inner.probed.len())
            .field("overrides", &inner.overrides.len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl CapabilityCache {
    /// Empty, memory-only cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache that writes through to `store`. Nothing is loaded.
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Cache seeded from whatever `store` currently holds.
    pub fn load_from_store(store: Arc<dyn CacheStore>) -> Result<Self> {
        let loaded = store.load()?;
        let cache = Self::with_store(store);
        if let Some(file) = loaded {
            let mut inner = cache.write();
            inner.probed = file
                .models
                .into_iter()
                .map(|(key, entry)| (canonicalize_key(key), entry))
                .collect();
            inner.overrides = file
                .local_overrides
                .into_iter()
                .map(|(key, patch)| (canonicalize_key(key), patch))
                .collect();
        }
        Ok(cache)
    }

    /// Effective capability vector for `(provider, model)`.
    pub fn get_capabilities(&self, provider: &str, model: &str) -> ProbedCapabilities {
        let key = canonical_cache_key(provider, model);
        let mut caps = provider_defaults(provider);
        if let Some(patch) = static_override(provider, model) {
            patch.apply_to(&mut caps);
        }
        let inner = self.read();
        if let Some(entry) = inner.probed.get(&key) {
            entry.capabilities.apply_to(&mut caps);
        }
        if let Some(patch) = inner.overrides.get(&key) {
            patch.apply_to(&mut caps);
        }
        caps
    }

    /// Highest-precedence tier holding any entry for the key.
    pub fn get_capability_source(&self, provider: &str, model: &str) -> CapabilitySource {
        let key = canonical_cache_key(provider, model);
        {
            let inner = self.read();
            if inner.overrides.contains_key(&key) {
                return CapabilitySource::LocalOverride;
            }
            if inner.probed.contains_key(&key) {
                return CapabilitySource::Probed;
            }
        }
        if static_override(provider, model).is_some() {
            CapabilitySource::StaticOverride
        } else {
            CapabilitySource::ProviderDefault
        }
    }

    /// Replace the probed entry for the result's key and persist.
    pub fn update_from_probe_result(&self, result: &ModelProbeResult) -> Result<()> {
        let key = canonical_cache_key(&result.provider, &result.model);
        self.write().probed.insert(
            key,
            CacheEntry {
                capabilities: CapabilityPatch::measured(&result.capabilities),
                probed_at: result.probed_at,
            },
        );
        tracing::debug!(
            provider = %result.provider,
            model = %result.model,
            "Committed probe result"
        );
        self.persist()
    }

    pub fn get_probed_entry(&self, provider: &str, model: &str) -> Option<CacheEntry> {
        self.read()
            .probed
            .get(&canonical_cache_key(provider, model))
            .cloned()
    }

    pub fn local_override(&self, provider: &str, model: &str) -> Option<CapabilityPatch> {
        self.read()
            .overrides
            .get(&canonical_cache_key(provider, model))
            .copied()
    }

    /// Merge `patch` onto any existing override for the key.
    ///
    /// An empty patch is rejected; use [`Self::remove_local_override`].
    pub fn set_local_override(&self, provider: &str, model: &str, patch: CapabilityPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(ProbeError::Configuration(format!(
                "override for {} sets no capability fields",
                canonical_cache_key(provider, model)
            )));
        }
        self.write()
            .overrides
            .entry(canonical_cache_key(provider, model))
            .or_default()
            .merge(&patch);
        self.persist()
    }

    /// Returns whether an override existed.
    pub fn remove_local_override(&self, provider: &str, model: &str) -> Result<bool> {
        let removed = self
            .write()
            .overrides
            .remove(&canonical_cache_key(provider, model))
            .is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Drop every local override. The probed tier is untouched.
    pub fn clear_local_overrides(&self) -> Result<()> {
        self.write().overrides.clear();
        self.persist()
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        let inner = self.read();
        let mut stats = CacheStats {
            model_count: inner.probed.len(),
            ..CacheStats::default()
        };
        for (key, entry) in &inner.probed {
            let provider = parse_cache_key(key)
                .map(|parsed| parsed.provider)
                .unwrap_or_else(|_| key.clone());
            *stats.provider_breakdown.entry(provider).or_default() += 1;
            stats.oldest_entry = Some(match stats.oldest_entry {
                Some(oldest) => oldest.min(entry.probed_at),
                None => entry.probed_at,
            });
            stats.newest_entry = Some(match stats.newest_entry {
                Some(newest) => newest.max(entry.probed_at),
                None => entry.probed_at,
            });
        }
        stats
    }

    /// True when the key was never probed or its entry is older than `max_age`.
    pub fn needs_probe(&self, provider: &str, model: &str, max_age: std::time::Duration) -> bool {
        let Some(entry) = self.get_probed_entry(provider, model) else {
            return true;
        };
        match chrono::Duration::from_std(max_age) {
            Ok(max_age) => Utc::now() - entry.probed_at > max_age,
            Err(_) => false,
        }
    }

    /// Serializable copy of both mutable tiers.
    pub fn snapshot(&self) -> CacheFile {
        let inner = self.read();
        CacheFile {
            models: inner.probed.clone(),
            local_overrides: inner.overrides.clone(),
            ..CacheFile::default()
        }
    }

    /// Fold `other` into this cache without persisting.
    ///
    /// Probed entries keep whichever side has the newer `probedAt`.
    /// Overrides from `other` fill only keys this cache has none for.
    pub fn merge(&self, other: CacheFile) {
        let mut inner = self.write();
        for (key, entry) in other.models {
            let key = canonicalize_key(key);
            let newer = inner
                .probed
                .get(&key)
                .map_or(true, |existing| existing.probed_at < entry.probed_at);
            if newer {
                inner.probed.insert(key, entry);
            }
        }
        for (key, patch) in other.local_overrides {
            inner
                .overrides
                .entry(canonicalize_key(key))
                .or_insert(patch);
        }
    }

    /// Write the current snapshot to the attached store, if any.
    ///
    /// The snapshot is taken under the persist lock, so the last save to
    /// finish always holds every mutation that preceded it.
    pub fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let _guard = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        store.save(&self.snapshot())
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
