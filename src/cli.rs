//! Command-line interface definitions for the OKX news scraper.
//!
//! The three positional arguments select the date range and output folder.
//! Tuning options can be given as flags or environment variables.

use crate::config::{self, ScraperConfig};
use crate::error::ScrapeError;
use clap::Parser;
use std::time::Duration;

/// Download OKX news within a date range.
///
/// # Examples
///
/// ```sh
/// # October 2020 announcements into ./output
/// okx_news_scraper 2020-10-01 2020-10-30 ./output
///
/// # Slower crawl, smaller batches
/// okx_news_scraper 2020-10-01 2020-10-30 ./output --request-delay-ms 2500 --batch-size 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Start date in YYYY-MM-DD format.
    pub start_date: String,

    /// End date in YYYY-MM-DD format.
    pub end_date: String,

    /// Folder to save the news data.
    pub output_folder: String,

    /// First listing page of the announcements category
    #[arg(long, env = "OKX_LISTING_URL", default_value = config::LISTING_ROOT)]
    pub listing_url: String,

    /// Number of articles buffered before each write to the output file
    #[arg(long, env = "OKX_BATCH_SIZE", default_value_t = config::BATCH_SIZE)]
    pub batch_size: usize,

    /// Pause after every request, in milliseconds
    #[arg(long, env = "OKX_REQUEST_DELAY_MS", default_value_t = 1000)]
    pub request_delay_ms: u64,

    /// Retries on 429/5xx responses and connection failures
    #[arg(long, env = "OKX_MAX_RETRIES", default_value_t = config::MAX_RETRIES)]
    pub max_retries: usize,

    /// Per-request timeout, in seconds
    #[arg(long, env = "OKX_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Stop after this many listing pages
    #[arg(long, env = "OKX_MAX_PAGES")]
    pub max_pages: Option<usize>,
}

impl Cli {
    /// Turn the parsed flags into a [`ScraperConfig`].
    pub fn scraper_config(&self) -> Result<ScraperConfig, ScrapeError> {
        if self.batch_size == 0 {
            return Err(ScrapeError::InvalidArgument(
                "Batch size must be at least 1.".to_string(),
            ));
        }
        let mut cfg = ScraperConfig::for_listing(&self.listing_url)?;
        cfg.batch_size = self.batch_size;
        cfg.request_delay = Duration::from_millis(self.request_delay_ms);
        cfg.max_retries = self.max_retries;
        cfg.timeout = Duration::from_secs(self.timeout_secs);
        cfg.max_pages = self.max_pages;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["okx_news_scraper", "2020-10-01", "2020-10-30", "./output"]);

        assert_eq!(cli.start_date, "2020-10-01");
        assert_eq!(cli.end_date, "2020-10-30");
        assert_eq!(cli.output_folder, "./output");
        assert_eq!(cli.batch_size, 100);
        assert_eq!(cli.max_pages, None);
    }

    #[test]
    fn test_cli_flags_into_config() {
        let cli = Cli::parse_from([
            "okx_news_scraper",
            "2020-10-01",
            "2020-10-30",
            "/tmp/out",
            "--listing-url",
            "http://localhost:9000/help/category/announcements",
            "--batch-size",
            "10",
            "--request-delay-ms",
            "0",
            "--max-pages",
            "3",
        ]);
        let cfg = cli.scraper_config().unwrap();

        assert_eq!(cfg.origin.as_str(), "http://localhost:9000/");
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.request_delay, Duration::ZERO);
        assert_eq!(cfg.max_pages, Some(3));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cli = Cli::parse_from([
            "okx_news_scraper",
            "2020-10-01",
            "2020-10-30",
            "./output",
            "--batch-size",
            "0",
        ]);
        assert!(matches!(
            cli.scraper_config(),
            Err(ScrapeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_positional_is_rejected() {
        assert!(Cli::try_parse_from(["okx_news_scraper", "2020-10-01"]).is_err());
    }
}
