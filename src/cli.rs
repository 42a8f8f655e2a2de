//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

/// Keep only the IP addresses that are not served by a known CDN or WAF.
///
/// Reads one address per line and writes the survivors, in input order.
/// Invalid lines and failed checks are reported inline; addresses matched
/// by a CDN or WAF provider are dropped silently.
///
/// Environment: CDNFILTER_CONFIG (YAML configuration file),
/// CDNFILTER_LOG (error, warn, info, debug, trace).
#[derive(Parser, Debug)]
#[command(name = "cdnfilter")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Input file name containing IP addresses (default: piped stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file name (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
