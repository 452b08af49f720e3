//! HTTP page fetching with retry and rate limiting.
//!
//! The fetcher is built from small decorators around the [`FetchPage`] trait:
//! - [`HttpFetcher`]: a single GET through `reqwest` with a request timeout
//! - [`RetryFetch`]: retries transient failures with exponential backoff
//! - [`Throttled`]: waits a fixed interval after every completed request
//!
//! [`build_fetcher`] stacks them as `Throttled<RetryFetch<HttpFetcher>>`, so the
//! politeness delay applies once per logical request, after retries are done.
//!
//! # Retry Strategy
//!
//! - Retried: HTTP 429, 500, 502, 503, 504 and connection-level failures
//! - Up to 5 retries after the first attempt
//! - Backoff 1s, 2s, 4s, 8s, 16s (capped at 30s) plus 0-250ms of jitter

use crate::config::ScraperConfig;
use crate::error::{FetchFailure, ScrapeError};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Something that can turn a URL into a response body.
pub trait FetchPage {
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure>;
}

/// Fetch a page, turning any failure into a [`ScrapeError::Fetch`].
pub async fn fetch_document<F: FetchPage>(fetcher: &F, url: &Url) -> Result<String, ScrapeError> {
    fetcher.fetch(url).await.map_err(|cause| ScrapeError::Fetch {
        url: url.to_string(),
        cause,
    })
}

/// Build the production fetcher stack from the run settings.
pub fn build_fetcher(
    cfg: &ScraperConfig,
) -> Result<Throttled<RetryFetch<HttpFetcher>>, ScrapeError> {
    let http = HttpFetcher::new(cfg.timeout)?;
    let retry =
        RetryFetch::new(http, cfg.max_retries, cfg.backoff_base).with_jitter(cfg.max_jitter);
    Ok(Throttled::new(retry, cfg.request_delay))
}

/// Plain HTTP GET. Non-2xx statuses become [`FetchFailure::Status`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client })
    }
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        let t0 = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retries to any [`FetchPage`].
///
/// Only transient failures are retried. The delay before retry `n` is
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T: FetchPage> RetryFetch<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(31) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: FetchPage> FetchPage for RetryFetch<T> {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() {
                        return Err(e);
                    }
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Waits `delay` after every request completes, whatever its outcome.
#[derive(Debug)]
pub struct Throttled<T> {
    inner: T,
    delay: Duration,
}

impl<T: FetchPage> Throttled<T> {
    pub fn new(inner: T, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<T: FetchPage> FetchPage for Throttled<T> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchFailure> {
        let res = self.inner.fetch(url).await;
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        res
    }
}
