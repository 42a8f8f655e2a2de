//! Per-line pass/drop/diagnostic decisions.
//!
//! Matched addresses are dropped without a trace while invalid lines and
//! failed checks are reported in the output stream.

use std::fmt;
use std::net::IpAddr;

use super::dispatch::ClassificationOutcome;

/// What one input line contributes to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineResult {
    /// Not attributable to any CDN or WAF provider.
    Pass(IpAddr),
    Diagnostic(String),
}

impl fmt::Display for LineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineResult::Pass(ip) => write!(f, "{}", ip),
            LineResult::Diagnostic(message) => f.write_str(message),
        }
    }
}

/// Diagnostic for a line that is not an address.
pub fn reject(text: &str) -> LineResult {
    LineResult::Diagnostic(format!("Invalid IP address: {}", text))
}

/// Decide the fate of a classified address. `None` means a silent drop.
pub fn decide(ip: IpAddr, outcome: ClassificationOutcome) -> Option<LineResult> {
    match outcome {
        ClassificationOutcome::Failed { stage, cause } => Some(LineResult::Diagnostic(format!(
            "{} check error: {}",
            stage, cause
        ))),
        outcome if outcome.is_matched() => None,
        ClassificationOutcome::Classified { .. } => Some(LineResult::Pass(ip)),
    }
}
