//! Runtime settings for a scraping run.

use crate::error::ScrapeError;
use std::time::Duration;
use url::Url;

/// Root of the OKX announcements listing.
pub const LISTING_ROOT: &str = "https://www.okx.com/help/category/announcements";
/// Records buffered before a flush to disk.
pub const BATCH_SIZE: usize = 100;
/// Pause after every completed request.
pub const REQUEST_DELAY: Duration = Duration::from_secs(1);
/// Retries after the first attempt on transient failures.
pub const MAX_RETRIES: usize = 5;
/// First backoff interval; doubles with each retry.
pub const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// First listing page to fetch.
    pub listing_url: Url,
    /// Origin that relative listing and pagination links are resolved against.
    pub origin: Url,
    pub batch_size: usize,
    pub request_delay: Duration,
    pub max_retries: usize,
    pub backoff_base: Duration,
    /// Upper bound on random jitter added to each backoff.
    pub max_jitter: Duration,
    pub timeout: Duration,
    /// Optional cap on listing pages visited in one run.
    pub max_pages: Option<usize>,
}

impl ScraperConfig {
    /// Settings for a listing URL, with every other knob at its default.
    pub fn for_listing(listing_url: &str) -> Result<Self, ScrapeError> {
        let listing_url = Url::parse(listing_url).map_err(|e| {
            ScrapeError::InvalidArgument(format!("Listing URL '{listing_url}' is invalid: {e}"))
        })?;
        let origin = origin_of(&listing_url)?;
        Ok(Self::with_urls(listing_url, origin))
    }

    fn with_urls(listing_url: Url, origin: Url) -> Self {
        Self {
            listing_url,
            origin,
            batch_size: BATCH_SIZE,
            request_delay: REQUEST_DELAY,
            max_retries: MAX_RETRIES,
            backoff_base: BACKOFF_BASE,
            max_jitter: Duration::from_millis(250),
            timeout: REQUEST_TIMEOUT,
            max_pages: None,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::with_urls(
            Url::parse(LISTING_ROOT).unwrap(),
            Url::parse("https://www.okx.com/").unwrap(),
        )
    }
}

/// `scheme://host[:port]/` of an absolute URL.
fn origin_of(url: &Url) -> Result<Url, ScrapeError> {
    if !url.has_host() {
        return Err(ScrapeError::InvalidArgument(format!(
            "Listing URL '{url}' has no host"
        )));
    }
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_okx() {
        let cfg = ScraperConfig::default();
        assert_eq!(cfg.listing_url.as_str(), LISTING_ROOT);
        assert_eq!(cfg.origin.as_str(), "https://www.okx.com/");
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.request_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_origin_keeps_port() {
        let listing = "http://127.0.0.1:8080/help/category/announcements?page=2";
        let cfg = ScraperConfig::for_listing(listing).unwrap();
        assert_eq!(cfg.origin.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_rejects_relative_listing_url() {
        let err = ScraperConfig::for_listing("/help/category/announcements").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidArgument(_)));
    }
}
