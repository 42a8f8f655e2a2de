//! Range-based classifier.

use anyhow::Result;
use chrono::Utc;
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::IpAddr;
use tracing::{debug, info, warn};

use super::{Classifier, Match};
use crate::cache::RangeCache;
use crate::config::Config;
use crate::error::CheckError;
use crate::fetcher::Fetcher;
use crate::providers::{Provider, ProviderKind};

/// Aggregated ranges of one provider.
///
/// A provider without any usable data is kept as unavailable, so that a miss
/// against it is reported as an error instead of a false "not matched".
#[derive(Debug, Clone)]
pub struct ProviderRanges {
    name: String,
    kinds: Vec<ProviderKind>,
    ranges: Option<(Vec<Ipv4Net>, Vec<Ipv6Net>)>,
}

impl ProviderRanges {
    pub fn new(name: impl Into<String>, kinds: Vec<ProviderKind>, nets: &[IpNet]) -> Self {
        let mut v4: Vec<Ipv4Net> = Vec::new();
        let mut v6: Vec<Ipv6Net> = Vec::new();
        for net in nets {
            match net {
                IpNet::V4(n) => v4.push(*n),
                IpNet::V6(n) => v6.push(*n),
            }
        }

        // Aggregation leaves disjoint networks; sorting them lets lookups
        // binary search on the network address.
        let mut v4 = Ipv4Net::aggregate(&v4);
        let mut v6 = Ipv6Net::aggregate(&v6);
        v4.sort_by_key(|n| n.network());
        v6.sort_by_key(|n| n.network());

        Self {
            name: name.into(),
            kinds,
            ranges: Some((v4, v6)),
        }
    }

    pub fn unavailable(name: impl Into<String>, kinds: Vec<ProviderKind>) -> Self {
        Self {
            name: name.into(),
            kinds,
            ranges: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.ranges.is_some()
    }

    /// Number of aggregated networks.
    pub fn network_count(&self) -> usize {
        self.ranges
            .as_ref()
            .map_or(0, |(v4, v6)| v4.len() + v6.len())
    }

    /// `None` when the provider has no data.
    pub fn contains(&self, ip: IpAddr) -> Option<bool> {
        let (v4, v6) = self.ranges.as_ref()?;
        let found = match ip {
            IpAddr::V4(addr) => {
                let idx = v4.partition_point(|n| n.network() <= addr);
                idx > 0 && v4[idx - 1].contains(&addr)
            }
            IpAddr::V6(addr) => {
                let idx = v6.partition_point(|n| n.network() <= addr);
                idx > 0 && v6[idx - 1].contains(&addr)
            }
        };
        Some(found)
    }
}

/// Classifier matching addresses against provider ranges.
#[derive(Debug, Clone, Default)]
pub struct RangeClassifier {
    providers: Vec<ProviderRanges>,
}

impl RangeClassifier {
    pub fn new(providers: Vec<ProviderRanges>) -> Self {
        Self { providers }
    }

    /// Build from the embedded/static ranges only. No network access.
    pub fn from_snapshots(providers: &[Provider]) -> Result<Self> {
        let mut ranges = Vec::with_capacity(providers.len());
        for provider in providers {
            let snapshot = provider.snapshot()?;
            if snapshot.is_empty() {
                warn!(
                    "Provider {} has no static ranges; enable refresh to download them",
                    provider.name
                );
                ranges.push(ProviderRanges::unavailable(
                    &provider.name,
                    provider.kinds.clone(),
                ));
            } else {
                ranges.push(ProviderRanges::new(
                    &provider.name,
                    provider.kinds.clone(),
                    &snapshot,
                ));
            }
        }
        Ok(Self::new(ranges))
    }

    /// Build the classifier for a configuration.
    ///
    /// With `refresh` enabled, providers that publish their ranges use, in
    /// order of preference: a fresh cache entry, a new download, a stale cache
    /// entry, the embedded snapshot.
    pub async fn load(config: &Config) -> Result<Self> {
        let providers = config.active_providers();
        if !config.refresh {
            let classifier = Self::from_snapshots(&providers)?;
            classifier.log_loaded();
            return Ok(classifier);
        }

        let cache_path = config.cache.resolved_path();
        let mut cache = match &cache_path {
            Some(path) => RangeCache::load(path).unwrap_or_else(|e| {
                warn!("Ignoring range cache: {:#}", e);
                RangeCache::default()
            }),
            None => RangeCache::default(),
        };

        let now = Utc::now();
        let max_age = config.cache_max_age()?;
        let due: Vec<&Provider> = providers
            .iter()
            .filter(|p| p.is_refreshable())
            .filter(|p| {
                !cache
                    .get(&p.name)
                    .is_some_and(|entry| entry.is_fresh(max_age, now))
            })
            .collect();

        if !due.is_empty() {
            let fetcher = Fetcher::new(&config.fetch)?;
            let mut updated = false;
            for (name, result) in fetcher.fetch_providers(&due).await {
                match result {
                    Ok(nets) => {
                        cache.insert(&name, nets, now);
                        updated = true;
                    }
                    Err(e) => warn!("Failed to refresh {} ranges: {:#}", name, e),
                }
            }

            if let (true, Some(path)) = (updated, &cache_path) {
                match cache.save(path) {
                    Ok(()) => debug!("Saved range cache to {:?}", path),
                    Err(e) => warn!("Failed to save range cache: {:#}", e),
                }
            }
        } else {
            debug!("Range cache is fresh; nothing to download");
        }

        let mut ranges = Vec::with_capacity(providers.len());
        for provider in &providers {
            let live = if provider.is_refreshable() {
                cache.get(&provider.name)
            } else {
                None
            };

            let entry = match live {
                Some(entry) => {
                    if !entry.is_fresh(max_age, now) {
                        warn!(
                            "Using stale {} ranges from {}",
                            provider.name,
                            entry.fetched_at.format("%Y-%m-%d %H:%M UTC")
                        );
                    }
                    ProviderRanges::new(&provider.name, provider.kinds.clone(), &entry.ranges)
                }
                None => {
                    let snapshot = provider.snapshot()?;
                    if snapshot.is_empty() {
                        warn!("No range data available for {}", provider.name);
                        ProviderRanges::unavailable(&provider.name, provider.kinds.clone())
                    } else {
                        if provider.is_refreshable() {
                            warn!("Using embedded {} ranges", provider.name);
                        }
                        ProviderRanges::new(&provider.name, provider.kinds.clone(), &snapshot)
                    }
                }
            };
            ranges.push(entry);
        }

        let classifier = Self::new(ranges);
        classifier.log_loaded();
        Ok(classifier)
    }

    fn log_loaded(&self) {
        for provider in &self.providers {
            let kinds: Vec<String> = provider.kinds.iter().map(|k| k.to_string()).collect();
            debug!(
                "{} ({}): {} networks",
                provider.name,
                kinds.join("+"),
                provider.network_count()
            );
        }
        info!(
            "Loaded {} providers ({} unavailable)",
            self.providers.len(),
            self.providers.iter().filter(|p| !p.is_available()).count()
        );
    }

    /// A match from any available provider wins; a miss is only trusted when
    /// every provider of the kind has data.
    fn check(&self, kind: ProviderKind, ip: IpAddr) -> Result<Match, CheckError> {
        let mut unavailable = Vec::new();
        for provider in self.providers.iter().filter(|p| p.kinds.contains(&kind)) {
            match provider.contains(ip) {
                Some(true) => return Ok(Match::hit(&provider.name)),
                Some(false) => {}
                None => unavailable.push(provider.name.clone()),
            }
        }

        if unavailable.is_empty() {
            Ok(Match::miss())
        } else {
            Err(CheckError::RangesUnavailable {
                providers: unavailable,
            })
        }
    }
}

impl Classifier for RangeClassifier {
    fn check_cdn(&self, ip: IpAddr) -> Result<Match, CheckError> {
        self.check(ProviderKind::Cdn, ip)
    }

    fn check_waf(&self, ip: IpAddr) -> Result<Match, CheckError> {
        self.check(ProviderKind::Waf, ip)
    }
}
