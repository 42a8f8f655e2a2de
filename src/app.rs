//! Filter command: I/O selection, classifier setup and status reporting.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::Path;

use tracing::debug;

use crate::classifier::RangeClassifier;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::FilterError;
use crate::pipeline;

/// Print a terminal status message. Never written to the output stream.
pub fn report(message: &dyn std::fmt::Display) {
    eprintln!("{}", message);
}

/// Run the filter described by the command line.
pub async fn run(cli: &Cli) -> Result<(), FilterError> {
    let config = Config::from_env().map_err(FilterError::Config)?;
    run_with_config(cli, &config).await
}

/// Run the filter with an already loaded configuration.
///
/// Setup failures are returned before any line is processed, and before the
/// output file is created. Read and write failures during the run are
/// reported here, after the output is flushed.
pub async fn run_with_config(cli: &Cli, config: &Config) -> Result<(), FilterError> {
    let input = open_input(cli.input.as_deref())?;
    let classifier = RangeClassifier::load(config)
        .await
        .map_err(FilterError::Ranges)?;
    let output = create_output(cli.output.as_deref())?;

    let result = tokio::task::spawn_blocking(move || pipeline::run(input, output, &classifier))
        .await
        .unwrap_or_else(|e| std::panic::resume_unwind(e.into_panic()));

    match result {
        Ok(summary) => debug!("{:?}", summary),
        Err(err) => report(&err),
    }

    if let Some(path) = &cli.output {
        report(&format!(
            "Processing completed. Output written to {}",
            path.display()
        ));
    }

    Ok(())
}

/// Open the named input file, or stdin when it is piped or redirected.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead + Send>, FilterError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|source| FilterError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(FilterError::NoInput);
            }
            Ok(Box::new(BufReader::new(stdin)))
        }
    }
}

/// Create (truncate) the named output file, or use stdout.
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write + Send>, FilterError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| FilterError::OutputCreate {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}
