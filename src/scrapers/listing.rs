//! OKX announcement listing pages.
//!
//! A listing page holds a reverse-chronological list of article items and a
//! "next page" link. Each item looks like:
//!
//! ```html
//! <li class="index_articleItem__d-8iK">
//!   <a class="okui-powerLink index_articleLink__Z6ycB" href="/help/some-article">
//!     <div class="index_title__iTmos index_articleTitle__ys7G7">Title</div>
//!   </a>
//!   <span data-testid="DateDisplay">Published on Oct 5, 2020</span>
//! </li>
//! ```
//!
//! Relative links are resolved against the site origin.
//!
//! # Malformed Items
//!
//! An item missing its date, title or link is skipped and reported in
//! [`ListingPage::skipped`]. Only a page with no article items at all is a
//! [`ScrapeError::Parse`].

use crate::error::ScrapeError;
use crate::models::ArticleSummary;
use crate::utils::{parse_label_date, truncate_for_log};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.index_articleItem__d-8iK").unwrap());
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[data-testid="DateDisplay"]"#).unwrap());
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.index_title__iTmos.index_articleTitle__ys7G7").unwrap());
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.index_articleLink__Z6ycB[href]").unwrap());
static NEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.okui-pagination-next[href]").unwrap());

/// Everything the crawler needs from one listing page.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Items in page order, most recent first.
    pub summaries: Vec<ArticleSummary>,
    /// Absolute URL of the next (older) page.
    pub next_page: Option<Url>,
    /// One message per item that could not be read.
    pub skipped: Vec<String>,
}

impl ListingPage {
    /// Oldest publication date on the page.
    pub fn oldest(&self) -> Option<NaiveDate> {
        self.summaries.iter().map(|s| s.published).min()
    }
}

/// Parse a listing page body.
///
/// # Arguments
///
/// * `body` - Raw HTML of the listing page
/// * `origin` - Site origin relative links are resolved against
/// * `page_url` - URL the body came from, used in error messages
#[instrument(level = "debug", skip_all, fields(%page_url))]
pub fn parse_listing(body: &str, origin: &Url, page_url: &Url) -> Result<ListingPage, ScrapeError> {
    let document = Html::parse_document(body);

    let mut page = ListingPage::default();
    let mut items = 0usize;
    for (index, item) in document.select(&ITEM_SELECTOR).enumerate() {
        items += 1;
        match parse_item(item, origin) {
            Ok(summary) => page.summaries.push(summary),
            Err(reason) => page.skipped.push(format!("item {index}: {reason}")),
        }
    }

    if items == 0 {
        return Err(ScrapeError::Parse {
            url: page_url.to_string(),
            reason: "no article items found on listing page".to_string(),
        });
    }

    page.next_page = document
        .select(&NEXT_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| origin.join(href).ok());

    debug!(
        items,
        parsed = page.summaries.len(),
        skipped = page.skipped.len(),
        next = ?page.next_page.as_ref().map(Url::as_str),
        "Parsed listing page"
    );
    Ok(page)
}

fn parse_item(item: ElementRef<'_>, origin: &Url) -> Result<ArticleSummary, String> {
    let label = item
        .select(&DATE_SELECTOR)
        .next()
        .map(element_text)
        .ok_or("missing date label")?;
    let published = parse_label_date(&label)
        .ok_or_else(|| format!("unreadable date '{}'", truncate_for_log(&label, 80)))?;

    let title = item
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or("missing title")?;

    let href = item
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or("missing link")?;
    let link = origin
        .join(href)
        .map_err(|e| format!("bad link '{href}': {e}"))?;

    Ok(ArticleSummary {
        published,
        title,
        link,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
