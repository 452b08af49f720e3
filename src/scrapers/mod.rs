//! Page parsers for the OKX help center.
//!
//! | Page | Module | Yields |
//! |------|--------|--------|
//! | Announcements listing | [`listing`] | Article summaries and the next-page link |
//! | Article detail | [`article`] | Content region text and markup |
//!
//! Both work on raw HTML through `scraper` selectors compiled once.

pub mod article;
pub mod listing;
