//! OKX announcement detail pages.
//!
//! The article body lives in a single content region, rendered either as rich
//! text (`div.index_richTextContent__9H5yk`) or from markdown
//! (`div.index_markdownContent__YOE4e`). The first region in document order wins.

use crate::fetcher::{FetchPage, fetch_document};
use crate::models::{ArticleBody, DetailOutcome, SkipReason};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.index_richTextContent__9H5yk, div.index_markdownContent__YOE4e").unwrap()
});

/// Fetch a detail page and extract its content region.
///
/// Never fails: fetch errors and missing content are reported as
/// [`DetailOutcome::Skipped`] so the caller can log them and move on.
#[instrument(level = "info", skip_all, fields(%link))]
pub async fn fetch_article_body<F: FetchPage>(fetcher: &F, link: &Url) -> DetailOutcome {
    let body = match fetch_document(fetcher, link).await {
        Ok(body) => body,
        Err(e) => return DetailOutcome::Skipped(SkipReason::Fetch(e)),
    };
    match parse_article_body(&body) {
        Ok(article) => {
            debug!(
                text_bytes = article.text.len(),
                html_bytes = article.html.len(),
                "Parsed article body"
            );
            DetailOutcome::Found(article)
        }
        Err(reason) => DetailOutcome::Skipped(reason),
    }
}

/// Extract text and markup from a detail page body.
pub fn parse_article_body(html: &str) -> Result<ArticleBody, SkipReason> {
    let document = Html::parse_document(html);
    let region = document
        .select(&CONTENT_SELECTOR)
        .next()
        .ok_or(SkipReason::NoContentRegion)?;

    let text = visible_text(region);
    if text.is_empty() {
        return Err(SkipReason::EmptyContent);
    }
    Ok(ArticleBody {
        text,
        html: region.html(),
    })
}

/// Every text node, trimmed, empty ones dropped, one per line.
fn visible_text(region: ElementRef<'_>) -> String {
    region
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
