//! CDN/WAF classification capability.
//!
//! The filtering pipeline only sees the [`Classifier`] trait. The production
//! implementation, [`RangeClassifier`], matches addresses against provider
//! range data assembled from the embedded snapshots, the range cache and,
//! optionally, live provider lists.

mod ranges;

use std::net::IpAddr;

#[cfg(test)]
use mockall::automock;

pub use ranges::{ProviderRanges, RangeClassifier};

use crate::error::CheckError;

/// Outcome of a single membership query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub matched: bool,
    /// Name of the provider whose range contains the address.
    pub provider: Option<String>,
}

impl Match {
    pub fn hit(provider: impl Into<String>) -> Self {
        Self {
            matched: true,
            provider: Some(provider.into()),
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }
}

/// Membership queries against known CDN and WAF provider ranges.
///
/// Both queries may fail independently; a failure is reported as a
/// [`CheckError`], never a panic.
#[cfg_attr(test, automock)]
pub trait Classifier: Send + Sync {
    /// Check whether the address belongs to a CDN provider.
    fn check_cdn(&self, ip: IpAddr) -> Result<Match, CheckError>;

    /// Check whether the address belongs to a WAF provider.
    fn check_waf(&self, ip: IpAddr) -> Result<Match, CheckError>;
}
