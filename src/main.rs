//! cdnfilter - strip CDN and WAF addresses from an IP list.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cdnfilter::app;
use cdnfilter::cli::Cli;

/// Environment variable selecting the log level
const LOG_ENV: &str = "CDNFILTER_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    // Logs go to stderr; stdout may be the filter output.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Failures are reported on stderr; the exit status stays 0.
    if let Err(err) = app::run(&cli).await {
        app::report(&err);
    }

    Ok(())
}
