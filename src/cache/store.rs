//! Disk persistence hook for the capability cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::capabilities::CapabilityPatch;
use crate::error::Result;

/// Current on-disk format version.
pub const CACHE_FILE_VERSION: u32 = 1;

/// `{version, models, localOverrides}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFile {
    pub version: u32,
    #[serde(default)]
    pub models: BTreeMap<String, CacheEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local_overrides: BTreeMap<String, CapabilityPatch>,
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: CACHE_FILE_VERSION,
            models: BTreeMap::new(),
            local_overrides: BTreeMap::new(),
        }
    }
}

/// Load/save hook supplied by the persistence layer.
pub trait CacheStore: Send + Sync {
    /// `None` when nothing usable is stored.
    fn load(&self) -> Result<Option<CacheFile>>;
    fn save(&self, file: &CacheFile) -> Result<()>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(Self::default_path())
    }

    /// `~/.modelprobe/capability-cache.json`.
    pub fn default_path() -> PathBuf {
        default_modelprobe_dir().join("capability-cache.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self) -> Result<Option<CacheFile>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: CacheFile = serde_json::from_str(&raw)?;
        if file.version != CACHE_FILE_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                found = file.version,
                expected = CACHE_FILE_VERSION,
                "Ignoring capability cache with unknown version"
            );
            return Ok(None);
        }
        Ok(Some(file))
    }

    fn save(&self, file: &CacheFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(file)?;
        let tmp = unique_tmp_path(&self.path);
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Sibling temp file unique to this process and save.
fn unique_tmp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("json.{}.{n}.tmp", std::process::id()))
}

fn default_modelprobe_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".modelprobe"))
        .unwrap_or_else(|| PathBuf::from(".modelprobe"))
}
