//! Paginated crawl of the announcements listing.
//!
//! The crawler walks listing pages from newest to oldest. For each page it
//! fetches the detail page of every article inside the requested date range and
//! hands the resulting records to the [`BatchWriter`].
//!
//! # Termination
//!
//! Listing pages are in descending date order, so once the oldest date seen so
//! far is on or before the range start, later pages can only hold older
//! articles. The crawl stops there, or earlier if there is no next page.
//!
//! # Failure Policy
//!
//! Listing fetch or parse errors and write errors abort the run. Detail page
//! problems only skip the article.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::fetcher::{FetchPage, fetch_document};
use crate::models::{ArticleRecord, DetailOutcome};
use crate::observer::CrawlObserver;
use crate::outputs::json::BatchWriter;
use crate::scrapers::article::fetch_article_body;
use crate::scrapers::listing::parse_listing;
use crate::utils::{DateRange, ensure_writable_dir, output_path};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use url::Url;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The oldest article seen is on or before the range start.
    ReachedStartDate,
    /// The page had no next link.
    LastPage,
    /// No page so far yielded a readable date.
    NoDates,
    /// The configured page limit was hit.
    PageLimit,
    /// The next link points at a page already visited.
    RevisitedPage,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::ReachedStartDate => "reached start date",
            StopReason::LastPage => "no next page",
            StopReason::NoDates => "no dated articles found",
            StopReason::PageLimit => "page limit reached",
            StopReason::RevisitedPage => "next page already visited",
        })
    }
}

/// Where the crawl goes after a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(Url),
    Done(StopReason),
}

/// Pagination state threaded through the crawl loop.
#[derive(Debug)]
pub struct CrawlState {
    /// Page to fetch next; `None` once the crawl is done.
    pub current_url: Option<Url>,
    /// Running minimum of publication dates over all pages so far.
    pub earliest_seen: Option<NaiveDate>,
    /// Listing pages fetched and parsed.
    pub pages: usize,
    visited: HashSet<Url>,
    seen_links: HashSet<Url>,
}

impl CrawlState {
    pub fn new(root: Url) -> Self {
        Self {
            current_url: Some(root),
            earliest_seen: None,
            pages: 0,
            visited: HashSet::new(),
            seen_links: HashSet::new(),
        }
    }

    /// Fold a parsed page into the state and pick the next page.
    ///
    /// # Arguments
    ///
    /// * `page_oldest` - Oldest date among the page's articles
    /// * `next` - The page's next link
    /// * `start` - Range start; pages past it are not needed
    /// * `max_pages` - Optional cap on pages per run
    pub fn advance(
        &mut self,
        page_oldest: Option<NaiveDate>,
        next: Option<Url>,
        start: NaiveDate,
        max_pages: Option<usize>,
    ) -> Transition {
        if let Some(done) = self.current_url.take() {
            self.visited.insert(done);
        }
        self.pages += 1;
        self.earliest_seen = match (self.earliest_seen, page_oldest) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        let transition = match (self.earliest_seen, next) {
            (None, _) => Transition::Done(StopReason::NoDates),
            (Some(earliest), _) if earliest <= start => {
                Transition::Done(StopReason::ReachedStartDate)
            }
            (_, None) => Transition::Done(StopReason::LastPage),
            _ if max_pages.is_some_and(|max| self.pages >= max) => {
                Transition::Done(StopReason::PageLimit)
            }
            (_, Some(url)) if self.visited.contains(&url) => {
                Transition::Done(StopReason::RevisitedPage)
            }
            (_, Some(url)) => Transition::Next(url),
        };

        if let Transition::Next(url) = &transition {
            self.current_url = Some(url.clone());
        }
        transition
    }

    /// Record a detail link; `false` if it was already scraped this run.
    fn first_sighting(&mut self, link: &Url) -> bool {
        self.seen_links.insert(link.clone())
    }
}

/// Counters for a finished crawl.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages: usize,
    pub scraped: usize,
    pub articles_skipped: usize,
    pub items_skipped: usize,
    pub duplicates: usize,
}

/// Drives listing pages, detail pages and the writer, strictly in sequence.
pub struct Crawler<F> {
    fetcher: F,
    config: ScraperConfig,
    range: DateRange,
    observer: Arc<dyn CrawlObserver>,
}

impl<F: FetchPage> Crawler<F> {
    pub fn new(
        fetcher: F,
        config: ScraperConfig,
        range: DateRange,
        observer: Arc<dyn CrawlObserver>,
    ) -> Self {
        Self {
            fetcher,
            config,
            range,
            observer,
        }
    }

    /// Crawl until a stop condition, streaming records into `writer`.
    ///
    /// Records reach the writer in discovery order: page order, then position
    /// on the page.
    #[instrument(
        level = "info",
        skip_all,
        fields(start = %self.range.start, end = %self.range.end)
    )]
    pub async fn run(&self, writer: &mut BatchWriter) -> Result<CrawlReport, ScrapeError> {
        let mut state = CrawlState::new(self.config.listing_url.clone());
        let mut report = CrawlReport::default();

        while let Some(url) = state.current_url.clone() {
            let body = fetch_document(&self.fetcher, &url).await?;
            let page = parse_listing(&body, &self.config.origin, &url)?;
            self.observer.page_parsed(state.pages + 1, &url, page.summaries.len());

            for reason in &page.skipped {
                self.observer.listing_item_skipped(&url, reason);
                report.items_skipped += 1;
            }

            let mut records = Vec::new();
            for summary in page
                .summaries
                .iter()
                .filter(|s| self.range.contains(s.published))
            {
                if !state.first_sighting(&summary.link) {
                    self.observer.duplicate_skipped(summary);
                    report.duplicates += 1;
                    continue;
                }
                match fetch_article_body(&self.fetcher, &summary.link).await {
                    DetailOutcome::Found(body) => {
                        records.push(ArticleRecord::new(summary, body));
                        self.observer.article_scraped(summary);
                        report.scraped += 1;
                    }
                    DetailOutcome::Skipped(reason) => {
                        self.observer.article_skipped(summary, &reason);
                        report.articles_skipped += 1;
                    }
                }
            }
            writer.append_all(records).await?;

            let oldest = page.oldest();
            if let Transition::Done(reason) =
                state.advance(oldest, page.next_page, self.range.start, self.config.max_pages)
            {
                self.observer.crawl_stopped(state.pages, &reason.to_string());
            }
        }

        report.pages = state.pages;
        Ok(report)
    }
}

/// Download every announcement in `range` into `<folder>/okx_news_<start>_<end>.json`.
///
/// Creates `folder` if needed and returns the path of the output file.
pub async fn download_news<F: FetchPage>(
    fetcher: F,
    config: &ScraperConfig,
    range: DateRange,
    folder: &Path,
    observer: Arc<dyn CrawlObserver>,
) -> Result<PathBuf, ScrapeError> {
    let t0 = Instant::now();
    ensure_writable_dir(folder).await?;

    let path = output_path(folder, &range);
    let mut writer = BatchWriter::create(&path, config.batch_size, observer.clone());
    let crawler = Crawler::new(fetcher, config.clone(), range, observer);

    let report = crawler.run(&mut writer).await?;
    let path = writer.finish().await?;

    info!(
        path = %path.display(),
        pages = report.pages,
        scraped = report.scraped,
        articles_skipped = report.articles_skipped,
        items_skipped = report.items_skipped,
        duplicates = report.duplicates,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Download complete"
    );
    Ok(path)
}
