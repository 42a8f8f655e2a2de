//! Error types for cdnfilter.
//!
//! The `Display` output of these types is user-facing: [`FilterError`] renders
//! the status-channel messages and [`CheckError`] renders the cause embedded in
//! `CDN check error: ...` / `WAF check error: ...` diagnostics.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Terminal failures of a filtering run.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Failed to load configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("Failed to load provider ranges: {0:#}")]
    Ranges(anyhow::Error),

    #[error("Failed to open input file: {}: {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output file: {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Please provide an input file name or pipe the data through standard input")]
    NoInput,

    #[error("Failed to read input: {0}")]
    StreamRead(#[source] io::Error),

    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// Failure of a single CDN or WAF membership query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("no range data available for {}", providers.join(", "))]
    RangesUnavailable { providers: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_open_message() {
        let err = FilterError::InputOpen {
            path: PathBuf::from("ips.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to open input file: ips.txt: No such file or directory"
        );
    }

    #[test]
    fn test_output_create_message() {
        let err = FilterError::OutputCreate {
            path: PathBuf::from("/ro/out.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create output file: /ro/out.txt: Permission denied"
        );
    }

    #[test]
    fn test_stream_read_message() {
        let err = FilterError::StreamRead(io::Error::other("boom"));
        assert_eq!(err.to_string(), "Failed to read input: boom");
    }

    #[test]
    fn test_no_input_message() {
        assert_eq!(
            FilterError::NoInput.to_string(),
            "Please provide an input file name or pipe the data through standard input"
        );
    }

    #[test]
    fn test_config_message_includes_chain() {
        let err = FilterError::Config(
            anyhow::anyhow!("invalid CIDR 'x'").context("Failed to parse config file"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to load configuration: Failed to parse config file: invalid CIDR 'x'"
        );
    }

    #[test]
    fn test_ranges_unavailable_message() {
        let err = CheckError::RangesUnavailable {
            providers: vec!["fastly".to_string(), "mycdn".to_string()],
        };
        assert_eq!(err.to_string(), "no range data available for fastly, mycdn");
    }
}
