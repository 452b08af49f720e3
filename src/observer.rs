//! Progress reporting for a crawl.
//!
//! The crawler and the batch writer report what they do through a
//! [`CrawlObserver`] handed to them at construction. [`TracingObserver`] turns
//! each event into a structured `tracing` record; tests install their own.

use crate::models::{ArticleSummary, SkipReason};
use std::path::Path;
use tracing::{info, warn};
use url::Url;

/// Receives crawl progress events. Every method defaults to a no-op.
pub trait CrawlObserver: Send + Sync {
    fn page_parsed(&self, _page: usize, _url: &Url, _summaries: usize) {}

    fn listing_item_skipped(&self, _url: &Url, _reason: &str) {}

    fn article_scraped(&self, _summary: &ArticleSummary) {}

    fn article_skipped(&self, _summary: &ArticleSummary, _reason: &SkipReason) {}

    fn duplicate_skipped(&self, _summary: &ArticleSummary) {}

    fn batch_flushed(&self, _path: &Path, _batch: usize, _total: usize) {}

    fn crawl_stopped(&self, _pages: usize, _reason: &str) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn page_parsed(&self, page: usize, url: &Url, summaries: usize) {
        info!(page, %url, summaries, "Parsed listing page");
    }

    fn listing_item_skipped(&self, url: &Url, reason: &str) {
        warn!(%url, reason, "Skipping malformed listing item");
    }

    fn article_scraped(&self, summary: &ArticleSummary) {
        info!(
            date = %summary.published,
            link = %summary.link,
            title = %summary.title,
            "Scraped article"
        );
    }

    fn article_skipped(&self, summary: &ArticleSummary, reason: &SkipReason) {
        warn!(link = %summary.link, reason = %reason, "Skipping article");
    }

    fn duplicate_skipped(&self, summary: &ArticleSummary) {
        info!(link = %summary.link, "Article already scraped on an earlier page");
    }

    fn batch_flushed(&self, path: &Path, batch: usize, total: usize) {
        info!(path = %path.display(), batch, total, "Flushed batch to output file");
    }

    fn crawl_stopped(&self, pages: usize, reason: &str) {
        info!(pages, reason, "Pagination finished");
    }
}
