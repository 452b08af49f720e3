//! Data models for scraped announcements.
//!
//! - [`ArticleSummary`]: one entry of a listing page, used to decide inclusion
//! - [`ArticleRecord`]: the persisted unit written to the output JSON array
//! - [`ArticleBody`] / [`DetailOutcome`] / [`SkipReason`]: result of the detail stage

use crate::error::ScrapeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// An article as it appears on a listing page.
///
/// Lives only as long as the listing page it came from: the crawler reads the
/// date to decide inclusion and then either fetches the detail page or drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSummary {
    /// Publication date shown on the listing (no time component).
    pub published: NaiveDate,
    /// The article title as displayed on the listing.
    pub title: String,
    /// Absolute URL of the detail page.
    pub link: Url,
}

/// A fully scraped article, one element of the output JSON array.
///
/// Field names are the ones written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Publication date in `YYYY-MM-DD` format.
    pub date: String,
    /// The article title.
    pub title: String,
    /// Absolute URL of the detail page.
    pub link: String,
    /// Visible text of the content region, one block per line.
    pub content_text: String,
    /// Serialized markup of the content region, including its own tag.
    pub content_html: String,
}

impl ArticleRecord {
    /// Combine a listing entry with the body scraped from its detail page.
    pub fn new(summary: &ArticleSummary, body: ArticleBody) -> Self {
        Self {
            date: summary.published.format("%Y-%m-%d").to_string(),
            title: summary.title.clone(),
            link: summary.link.to_string(),
            content_text: body.text,
            content_html: body.html,
        }
    }
}

/// Text and markup extracted from a detail page's content region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleBody {
    pub text: String,
    pub html: String,
}

/// Outcome of the detail stage for one article.
#[derive(Debug)]
pub enum DetailOutcome {
    Found(ArticleBody),
    Skipped(SkipReason),
}

/// Why an article produced no record.
#[derive(Debug)]
pub enum SkipReason {
    /// The detail page could not be fetched, even after retries.
    Fetch(ScrapeError),
    /// The page has neither a rich-text nor a markdown content region.
    NoContentRegion,
    /// The content region exists but holds no visible text.
    EmptyContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "{e}"),
            SkipReason::NoContentRegion => f.write_str("no content region found"),
            SkipReason::EmptyContent => f.write_str("content region is empty"),
        }
    }
}
