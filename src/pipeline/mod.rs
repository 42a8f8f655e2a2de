//! The streaming filter: parse -> classify -> decide -> emit.
//!
//! ```text
//!   input line ──► parse_line ──Invalid──────────────────► "Invalid IP address: …"
//!                      │
//!                    Valid
//!                      ▼
//!                  check_cdn ──error──────────────────────► "CDN check error: …"
//!                      │
//!                  check_waf ──error──────────────────────► "WAF check error: …"
//!                      │
//!            cdn or waf matched? ──yes──► (nothing)
//!                      │
//!                      no ───────────────────────────────► canonical address
//! ```

pub mod dispatch;
pub mod driver;
pub mod emit;
pub mod parse;

pub use dispatch::{classify, CheckStage, ClassificationOutcome};
pub use driver::{process_line, run, RunSummary, MAX_LINE_BYTES};
pub use emit::{decide, reject, LineResult};
pub use parse::{parse_line, ParsedAddress};
