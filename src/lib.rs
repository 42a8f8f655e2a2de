//! # cdnfilter - origin triage for IP lists
//!
//! Reads candidate IP addresses, one per line, and keeps only those that are
//! not attributable to a known CDN or WAF provider. What remains is likely
//! origin infrastructure.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        cdnfilter                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)  -i FILE / -o FILE, stdin / stdout              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline (sequential, input order)                         │
//! │    parse ─► check_cdn ─► check_waf ─► pass / drop / report  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Classifier trait                                           │
//! │    └── RangeClassifier (ipnet, aggregated per provider)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Provider data                                              │
//! │    ├── Embedded snapshots (Cloudflare, Fastly, CloudFront,  │
//! │    │   Akamai, Incapsula, Sucuri)                           │
//! │    ├── Fetcher (reqwest + rustls), opt-in refresh           │
//! │    └── Range cache (serde_json, atomic writes)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml, CDNFILTER_CONFIG)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use cdnfilter::classifier::RangeClassifier;
//! use cdnfilter::pipeline;
//! use cdnfilter::providers::builtin_providers;
//!
//! let classifier = RangeClassifier::from_snapshots(&builtin_providers())?;
//! let input = "8.8.8.8\n104.16.0.1\nnot-an-ip\n";
//! let mut output = Vec::new();
//! pipeline::run(input.as_bytes(), &mut output, &classifier)?;
//!
//! assert_eq!(
//!     String::from_utf8(output)?,
//!     "8.8.8.8\nInvalid IP address: not-an-ip\n"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`app`] - Input/output selection and status reporting
//! - [`cache`] - Downloaded range cache
//! - [`classifier`] - The `Classifier` trait and the range-based implementation
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error types
//! - [`fetcher`] - HTTP client for provider range lists
//! - [`pipeline`] - Parse, dispatch, decide and drive
//! - [`providers`] - Provider catalogue with embedded ranges

pub mod app;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod providers;

pub use classifier::{Classifier, Match, RangeClassifier};
pub use config::Config;
pub use error::{CheckError, FilterError};
