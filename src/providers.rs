//! CDN and WAF provider catalogue.
//!
//! Every built-in provider ships an embedded snapshot of its published
//! ranges, so classification works offline. Providers that publish a machine
//! readable list also carry refresh URLs and the format of that list.

use anyhow::{Context, Result};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// Category a provider's ranges count towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Cdn,
    Waf,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Cdn => f.write_str("cdn"),
            ProviderKind::Waf => f.write_str("waf"),
        }
    }
}

/// Format of a provider's published range list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// One IP or CIDR per line, `#` comments allowed
    #[default]
    Plain,
    /// Fastly `public-ip-list` JSON
    Fastly,
    /// AWS `ip-ranges.json`, filtered by service name
    Aws { service: String },
}

/// A CDN/WAF provider definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,

    /// Categories this provider belongs to
    pub kinds: Vec<ProviderKind>,

    /// Embedded or user-supplied ranges (IPs or CIDRs)
    #[serde(default)]
    pub ranges: Vec<String>,

    /// HTTPS URLs publishing the current ranges
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default)]
    pub format: SourceFormat,
}

impl Provider {
    /// Whether live ranges can be downloaded for this provider.
    pub fn is_refreshable(&self) -> bool {
        !self.urls.is_empty()
    }

    /// Parse the static ranges of this provider.
    pub fn snapshot(&self) -> Result<Vec<IpNet>> {
        self.ranges
            .iter()
            .map(|r| {
                parse_net(r).with_context(|| {
                    format!("Provider '{}' has an invalid range: '{}'", self.name, r)
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Provider name must not be empty");
        }
        if self.kinds.is_empty() {
            anyhow::bail!("Provider '{}' must list at least one kind (cdn, waf)", self.name);
        }
        if self.ranges.is_empty() && self.urls.is_empty() {
            anyhow::bail!("Provider '{}' needs ranges or urls", self.name);
        }
        for url in &self.urls {
            if !url.starts_with("https://") {
                anyhow::bail!("Provider '{}' URL must use HTTPS: {}", self.name, url);
            }
        }
        self.snapshot()?;
        Ok(())
    }
}

/// Parse an IP or CIDR string. A bare address becomes a host network.
pub fn parse_net(s: &str) -> Option<IpNet> {
    let trimmed = s.trim();
    if trimmed.contains('/') {
        trimmed.parse::<IpNet>().ok()
    } else {
        trimmed.parse::<IpAddr>().ok().map(IpNet::from)
    }
}

/// Check a provider list for duplicate names and invalid entries.
pub fn validate_all(providers: &[Provider]) -> Result<()> {
    let mut seen = HashSet::new();
    for provider in providers {
        provider.validate()?;
        if !seen.insert(provider.name.as_str()) {
            anyhow::bail!("Duplicate provider name: '{}'", provider.name);
        }
    }
    Ok(())
}

const CLOUDFLARE: &[&str] = &[
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/13",
    "104.24.0.0/14",
    "172.64.0.0/13",
    "131.0.72.0/22",
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

const FASTLY: &[&str] = &[
    "23.235.32.0/20",
    "43.249.72.0/22",
    "103.244.50.0/24",
    "103.245.222.0/23",
    "103.245.224.0/24",
    "104.156.80.0/20",
    "140.248.64.0/18",
    "140.248.128.0/17",
    "146.75.0.0/17",
    "151.101.0.0/16",
    "157.52.64.0/18",
    "167.82.0.0/17",
    "167.82.128.0/20",
    "167.82.160.0/20",
    "167.82.224.0/20",
    "172.111.64.0/18",
    "185.31.16.0/22",
    "199.27.72.0/21",
    "199.232.0.0/16",
    "2a04:4e40::/32",
    "2a04:4e42::/32",
];

const CLOUDFRONT: &[&str] = &[
    "13.32.0.0/15",
    "13.224.0.0/14",
    "13.249.0.0/16",
    "18.64.0.0/14",
    "18.154.0.0/15",
    "18.160.0.0/15",
    "18.164.0.0/15",
    "18.172.0.0/15",
    "52.84.0.0/15",
    "54.182.0.0/16",
    "54.192.0.0/16",
    "54.230.0.0/16",
    "54.239.128.0/18",
    "64.252.64.0/18",
    "99.84.0.0/16",
    "99.86.0.0/16",
    "108.138.0.0/15",
    "108.156.0.0/14",
    "130.176.0.0/17",
    "143.204.0.0/16",
    "204.246.164.0/22",
    "205.251.192.0/19",
    "2600:9000::/28",
];

const AKAMAI: &[&str] = &[
    "2.16.0.0/13",
    "23.0.0.0/12",
    "23.32.0.0/11",
    "23.192.0.0/11",
    "72.246.0.0/15",
    "88.221.0.0/16",
    "92.122.0.0/15",
    "95.100.0.0/15",
    "96.6.0.0/15",
    "104.64.0.0/10",
    "184.24.0.0/13",
    "184.50.0.0/15",
    "184.84.0.0/14",
    "2600:1400::/24",
    "2a02:26f0::/29",
];

const INCAPSULA: &[&str] = &[
    "45.60.0.0/16",
    "45.64.64.0/22",
    "45.223.0.0/16",
    "103.28.248.0/22",
    "107.154.0.0/16",
    "131.125.128.0/17",
    "149.126.72.0/21",
    "185.11.124.0/22",
    "192.230.64.0/18",
    "198.143.32.0/19",
    "199.83.128.0/21",
    "2a02:e980::/29",
];

const SUCURI: &[&str] = &[
    "66.248.200.0/22",
    "185.93.228.0/22",
    "192.88.134.0/23",
    "208.109.0.0/22",
    "2a02:fe80::/29",
];

fn strings(ranges: &[&str]) -> Vec<String> {
    ranges.iter().map(|s| s.to_string()).collect()
}

/// Built-in provider catalogue.
pub fn builtin_providers() -> Vec<Provider> {
    vec![
        Provider {
            name: "cloudflare".to_string(),
            kinds: vec![ProviderKind::Cdn, ProviderKind::Waf],
            ranges: strings(CLOUDFLARE),
            urls: vec![
                "https://www.cloudflare.com/ips-v4".to_string(),
                "https://www.cloudflare.com/ips-v6".to_string(),
            ],
            format: SourceFormat::Plain,
        },
        Provider {
            name: "fastly".to_string(),
            kinds: vec![ProviderKind::Cdn],
            ranges: strings(FASTLY),
            urls: vec!["https://api.fastly.com/public-ip-list".to_string()],
            format: SourceFormat::Fastly,
        },
        Provider {
            name: "cloudfront".to_string(),
            kinds: vec![ProviderKind::Cdn],
            ranges: strings(CLOUDFRONT),
            urls: vec!["https://ip-ranges.amazonaws.com/ip-ranges.json".to_string()],
            format: SourceFormat::Aws {
                service: "CLOUDFRONT".to_string(),
            },
        },
        Provider {
            name: "akamai".to_string(),
            kinds: vec![ProviderKind::Cdn],
            ranges: strings(AKAMAI),
            urls: Vec::new(),
            format: SourceFormat::Plain,
        },
        Provider {
            name: "incapsula".to_string(),
            kinds: vec![ProviderKind::Waf],
            ranges: strings(INCAPSULA),
            urls: Vec::new(),
            format: SourceFormat::Plain,
        },
        Provider {
            name: "sucuri".to_string(),
            kinds: vec![ProviderKind::Waf],
            ranges: strings(SUCURI),
            urls: Vec::new(),
            format: SourceFormat::Plain,
        },
    ]
}
