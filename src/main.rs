//! # OKX News Scraper
//!
//! Downloads OKX announcements published within a date range and saves them,
//! with their full text and markup, to a single JSON file.
//!
//! ## Usage
//!
//! ```sh
//! okx_news_scraper 2020-10-01 2020-10-30 ./output
//! ```
//!
//! On success the path of the output file is printed. On failure a single
//! `Error: <message>` line is printed and the exit code is non-zero
//! (2 for bad arguments, 1 for anything else).
//!
//! ## Architecture
//!
//! 1. **Fetching**: sequential, rate-limited HTTP with retries ([`fetcher`])
//! 2. **Listing**: parse article summaries and the next-page link ([`scrapers::listing`])
//! 3. **Detail**: extract each matching article's content region ([`scrapers::article`])
//! 4. **Crawl**: paginate backwards until the start date is passed ([`crawler`])
//! 5. **Output**: flush records to the JSON file in batches ([`outputs::json`])

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod error;
mod fetcher;
mod models;
mod observer;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use error::ScrapeError;
use observer::TracingObserver;
use utils::DateRange;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("okx_news_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let code = match run(&args).await {
        Ok(path) => {
            println!("News data saved to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            println!("Error: {e}");
            ExitCode::from(exit_status(&e))
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    code
}

/// Process exit status for a failed run: 2 for bad arguments, 1 otherwise.
fn exit_status(e: &ScrapeError) -> u8 {
    match e {
        ScrapeError::InvalidArgument(_) => 2,
        ScrapeError::Client(_)
        | ScrapeError::Fetch { .. }
        | ScrapeError::Parse { .. }
        | ScrapeError::Write { .. } => 1,
    }
}

/// Validate arguments, then crawl. No network activity happens before the
/// dates and settings are known to be valid.
#[instrument(level = "info", skip_all)]
async fn run(args: &Cli) -> Result<std::path::PathBuf, ScrapeError> {
    let range = DateRange::parse(&args.start_date, &args.end_date)?;
    let config = args.scraper_config()?;
    info!(
        start = %range.start,
        end = %range.end,
        listing = %config.listing_url,
        batch_size = config.batch_size,
        "Downloading OKX news"
    );

    let fetcher = fetcher::build_fetcher(&config)?;
    crawler::download_news(
        fetcher,
        &config,
        range,
        Path::new(&args.output_folder),
        Arc::new(TracingObserver),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;
    use std::io;

    #[test]
    fn test_bad_arguments_exit_with_two() {
        let err = DateRange::parse("2020-13-01", "2020-10-30").unwrap_err();
        assert_eq!(exit_status(&err), 2);

        let err = DateRange::parse("2020-10-30", "2020-10-01").unwrap_err();
        assert_eq!(exit_status(&err), 2);
    }

    #[test]
    fn test_run_failures_exit_with_one() {
        let fetch = ScrapeError::Fetch {
            url: "https://www.okx.com/help/category/announcements".to_string(),
            cause: FetchFailure::Status(503),
        };
        let parse = ScrapeError::Parse {
            url: "https://www.okx.com/help/category/announcements".to_string(),
            reason: "no article items found on listing page".to_string(),
        };
        let write = ScrapeError::write(
            "/tmp/out.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        for err in [fetch, parse, write] {
            assert_eq!(exit_status(&err), 1, "{err}");
        }
    }

    #[test]
    fn test_client_build_failure_is_not_an_argument_error() {
        let cause = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        let err = ScrapeError::Client(cause);
        assert_eq!(exit_status(&err), 1);
        assert!(err.to_string().starts_with("failed to build HTTP client"));
    }
}
