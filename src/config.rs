//! Configuration management for cdnfilter.
//!
//! Configuration is optional. When the `CDNFILTER_CONFIG` environment variable
//! names a YAML file it is loaded and validated; otherwise the defaults apply,
//! which classify against the embedded provider snapshots without any network
//! access.
//!
//! ```yaml
//! refresh: true
//! fetch:
//!   timeout_secs: 20
//!   max_retries: 2
//! cache:
//!   max_age_hours: 12
//! disabled_providers: [akamai]
//! providers:
//!   - name: edgecorp
//!     kinds: [cdn]
//!     ranges: ["198.51.100.0/24"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::providers::{builtin_providers, validate_all, Provider};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "CDNFILTER_CONFIG";

/// Largest `cache.max_age_hours` a chrono duration can represent
pub const MAX_CACHE_AGE_HOURS: u64 = i64::MAX as u64 / 3_600_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download current ranges for providers that publish them
    pub refresh: bool,

    /// HTTP settings for range downloads
    pub fetch: FetchConfig,

    /// Downloaded range cache
    pub cache: CacheConfig,

    /// Built-in or custom providers to ignore
    pub disabled_providers: Vec<String>,

    /// Additional providers; a custom provider replaces a built-in one of the same name
    pub providers: Vec<Provider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Cache file; defaults to `$XDG_CACHE_HOME/cdnfilter/ranges.json`
    pub path: Option<PathBuf>,

    /// Age after which cached ranges are downloaded again
    pub max_age_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_age_hours: 24,
        }
    }
}

impl CacheConfig {
    /// Cache file to use, if caching is enabled and a location is known.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.path.clone().or_else(default_cache_path)
    }
}

fn default_cache_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    Some(base.join("cdnfilter").join("ranges.json"))
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file named by `CDNFILTER_CONFIG`, or the defaults.
    pub fn from_env() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than 0");
        }
        if self.cache.max_age_hours == 0 {
            anyhow::bail!("cache.max_age_hours must be greater than 0");
        }
        if self.cache.max_age_hours > MAX_CACHE_AGE_HOURS {
            anyhow::bail!(
                "cache.max_age_hours must be at most {} (got {})",
                MAX_CACHE_AGE_HOURS,
                self.cache.max_age_hours
            );
        }

        validate_all(&self.providers)?;

        let builtin = builtin_providers();
        for name in &self.disabled_providers {
            let known = builtin.iter().any(|p| &p.name == name)
                || self.providers.iter().any(|p| &p.name == name);
            if !known {
                anyhow::bail!("Unknown provider in disabled_providers: '{}'", name);
            }
        }

        if self.active_providers().is_empty() {
            anyhow::bail!("All providers are disabled");
        }

        Ok(())
    }

    /// Providers to classify against: built-ins overridden by custom
    /// providers of the same name, then the remaining custom ones, minus the
    /// disabled ones.
    pub fn active_providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = builtin_providers()
            .into_iter()
            .map(|builtin| {
                self.providers
                    .iter()
                    .find(|custom| custom.name == builtin.name)
                    .cloned()
                    .unwrap_or(builtin)
            })
            .collect();

        for custom in &self.providers {
            if !providers.iter().any(|p| p.name == custom.name) {
                providers.push(custom.clone());
            }
        }

        providers.retain(|p| !self.disabled_providers.contains(&p.name));
        providers
    }

    pub fn cache_max_age(&self) -> Result<chrono::Duration> {
        i64::try_from(self.cache.max_age_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .with_context(|| {
                format!(
                    "cache.max_age_hours is out of range: {}",
                    self.cache.max_age_hours
                )
            })
    }
}
