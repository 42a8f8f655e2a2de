//! HTTP fetcher for provider range lists.

use anyhow::{Context, Result};
use ipnet::IpNet;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::providers::{parse_net, Provider, SourceFormat};

const RETRY_DELAY_MS: u64 = 1000;

/// Maximum size of a single range list (10 MB)
/// AWS ip-ranges.json, the largest list, is around 2 MB
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum concurrent downloads
const MAX_CONCURRENT_REQUESTS: usize = 4;

/// HTTP client for fetching provider ranges
pub struct Fetcher {
    client: Client,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("cdnfilter/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// Download and parse every URL of a provider.
    pub async fn fetch_provider(&self, provider: &Provider) -> Result<Vec<IpNet>> {
        info!("Fetching {} ranges...", provider.name);

        let mut nets = Vec::new();
        for url in &provider.urls {
            let content = self
                .fetch_with_retry(url)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            let parsed = parse_ranges(&content, &provider.format)
                .with_context(|| format!("Failed to parse {}", url))?;
            debug!("{}: {} ranges from {}", provider.name, parsed.len(), url);
            nets.extend(parsed);
        }

        if nets.is_empty() {
            anyhow::bail!("{} published no ranges", provider.name);
        }

        info!("Fetched {} - {} ranges", provider.name, nets.len());
        Ok(nets)
    }

    /// Fetch several providers concurrently with limited parallelism.
    ///
    /// Results come back in completion order, each tagged with the provider name.
    pub async fn fetch_providers(
        &self,
        providers: &[&Provider],
    ) -> Vec<(String, Result<Vec<IpNet>>)> {
        use futures::stream::{self, StreamExt};

        stream::iter(providers.iter().map(|provider| async move {
            (provider.name.clone(), self.fetch_provider(provider).await)
        }))
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .collect()
        .await
    }

    /// Fetch content with retry logic and size validation
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = RETRY_DELAY_MS * (1 << (attempt - 1).min(6));
                debug!("Retry {} after {}ms for {}", attempt, delay, url);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        last_error = Some(anyhow::anyhow!("HTTP {}", response.status()));
                        continue;
                    }

                    if let Some(content_length) = response.content_length() {
                        if content_length as usize > MAX_RESPONSE_SIZE {
                            anyhow::bail!(
                                "Response too large: {} bytes (max: {} bytes)",
                                content_length,
                                MAX_RESPONSE_SIZE
                            );
                        }
                    }

                    let body = response
                        .text()
                        .await
                        .context("Failed to read response body")?;

                    if body.len() > MAX_RESPONSE_SIZE {
                        anyhow::bail!(
                            "Downloaded content too large: {} bytes (max: {} bytes)",
                            body.len(),
                            MAX_RESPONSE_SIZE
                        );
                    }

                    return Ok(body);
                }
                Err(e) => {
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }
}

/// Parse a downloaded list according to its format.
pub fn parse_ranges(content: &str, format: &SourceFormat) -> Result<Vec<IpNet>> {
    match format {
        SourceFormat::Plain => Ok(parse_plain_list(content)),
        SourceFormat::Fastly => parse_fastly(content),
        SourceFormat::Aws { service } => parse_aws(content, service),
    }
}

/// Parse a plain list (one IP/CIDR per line, `#` comments)
pub fn parse_plain_list(content: &str) -> Vec<IpNet> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_net)
        .collect()
}

/// Parse Fastly's public IP list
fn parse_fastly(content: &str) -> Result<Vec<IpNet>> {
    #[derive(Deserialize)]
    struct FastlyRanges {
        #[serde(default)]
        addresses: Vec<String>,
        #[serde(default)]
        ipv6_addresses: Vec<String>,
    }

    let ranges: FastlyRanges = serde_json::from_str(content)?;
    Ok(ranges
        .addresses
        .iter()
        .chain(ranges.ipv6_addresses.iter())
        .filter_map(|s| parse_net(s))
        .collect())
}

/// Parse AWS ip-ranges.json, keeping prefixes of one service
fn parse_aws(content: &str, service: &str) -> Result<Vec<IpNet>> {
    #[derive(Deserialize)]
    struct AwsRanges {
        #[serde(default)]
        prefixes: Vec<AwsPrefix>,
        #[serde(default)]
        ipv6_prefixes: Vec<AwsIpv6Prefix>,
    }

    #[derive(Deserialize)]
    struct AwsPrefix {
        ip_prefix: String,
        service: String,
    }

    #[derive(Deserialize)]
    struct AwsIpv6Prefix {
        ipv6_prefix: String,
        service: String,
    }

    let ranges: AwsRanges = serde_json::from_str(content)?;

    let v4 = ranges
        .prefixes
        .iter()
        .filter(|p| p.service.eq_ignore_ascii_case(service))
        .filter_map(|p| parse_net(&p.ip_prefix));
    let v6 = ranges
        .ipv6_prefixes
        .iter()
        .filter(|p| p.service.eq_ignore_ascii_case(service))
        .filter_map(|p| parse_net(&p.ipv6_prefix));

    // AWS lists the same prefix once per region
    let unique: HashSet<IpNet> = v4.chain(v6).collect();
    let mut nets: Vec<IpNet> = unique.into_iter().collect();
    nets.sort();
    Ok(nets)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ipv4_cidr_string_strategy() -> impl Strategy<Value = String> {
        (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255, 0u8..=32)
            .prop_map(|(a, b, c, d, prefix)| format!("{}.{}.{}.{}/{}", a, b, c, d, prefix))
    }

    proptest! {
        /// Every valid CIDR line is kept
        #[test]
        fn prop_plain_list_keeps_valid(lines in prop::collection::vec(ipv4_cidr_string_strategy(), 0..50)) {
            let content = lines.join("\n");
            prop_assert_eq!(parse_plain_list(&content).len(), lines.len());
        }

        /// Arbitrary content never panics
        #[test]
        fn prop_plain_list_no_panic(content in "\\PC{0,200}") {
            let _ = parse_plain_list(&content);
        }
    }
}
