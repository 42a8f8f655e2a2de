//! On-disk cache of downloaded provider ranges.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Ranges downloaded for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRanges {
    pub fetched_at: DateTime<Utc>,
    pub ranges: Vec<IpNet>,
}

impl CachedRanges {
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) <= max_age
    }
}

/// Cache file contents, keyed by provider name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCache {
    #[serde(default)]
    pub providers: BTreeMap<String, CachedRanges>,
}

impl RangeCache {
    /// Load the cache, or an empty one if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read range cache: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse range cache: {:?}", path))
    }

    /// Save the cache atomically
    ///
    /// Uses tempfile + rename so a crash never leaves a truncated cache.
    pub fn save(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", parent_dir))?;

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize range cache")?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for range cache")?;
        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write range cache")?;
        temp_file
            .as_file()
            .sync_all()
            .context("Failed to sync range cache")?;
        temp_file
            .persist(path)
            .with_context(|| format!("Failed to move range cache into place: {:?}", path))?;

        Ok(())
    }

    pub fn get(&self, provider: &str) -> Option<&CachedRanges> {
        self.providers.get(provider)
    }

    pub fn insert(&mut self, provider: &str, ranges: Vec<IpNet>, fetched_at: DateTime<Utc>) {
        self.providers.insert(
            provider.to_string(),
            CachedRanges { fetched_at, ranges },
        );
    }
}
