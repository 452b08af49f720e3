//! Utility functions for date handling, output naming, and file system checks.
//!
//! - Parsing and validating the `YYYY-MM-DD` dates given on the command line
//! - Extracting publication dates from listing labels such as `Published on Oct 5, 2020`
//! - Deriving the output artifact name from the requested date range
//! - Making sure the output folder exists and is writable

use crate::error::ScrapeError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Literal prefix in front of every listing date label.
pub const DATE_LABEL_PREFIX: &str = "Published on ";

static LABEL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]{2,8}\.? \d{1,2}, \d{4}").unwrap());

/// An inclusive `[start, end]` window of publication dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScrapeError> {
        if start > end {
            return Err(ScrapeError::InvalidArgument(
                "Start date must be earlier than or equal to end date.".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse both command-line dates and validate their order.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScrapeError> {
        Self::new(parse_cli_date(start)?, parse_cli_date(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` command-line date.
pub fn parse_cli_date(s: &str) -> Result<NaiveDate, ScrapeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        ScrapeError::InvalidArgument(format!(
            "Date format for '{s}' is invalid. Use YYYY-MM-DD."
        ))
    })
}

/// Parse a listing date label like `Published on Oct 5, 2020`.
///
/// The prefix is stripped first; the date itself is then located with a
/// `<Mon> <D>, <YYYY>` pattern so surrounding text is tolerated.
///
/// Returns `None` when no valid date can be found.
pub fn parse_label_date(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    let label = label.strip_prefix(DATE_LABEL_PREFIX).unwrap_or(label);
    let found = LABEL_DATE_RE.find(label)?.as_str().replace('.', "");
    NaiveDate::parse_from_str(&found, "%b %d, %Y").ok()
}

/// File name of the output artifact for a date range.
///
/// # Examples
///
/// ```ignore
/// // 2020-10-01 .. 2020-10-30
/// assert_eq!(output_file_name(&range), "okx_news_20201001_20201030.json");
/// ```
pub fn output_file_name(range: &DateRange) -> String {
    format!(
        "okx_news_{}_{}.json",
        range.start.format("%Y%m%d"),
        range.end.format("%Y%m%d")
    )
}

/// Full path of the output artifact inside `folder`.
pub fn output_path(folder: &Path, range: &DateRange) -> PathBuf {
    folder.join(output_file_name(range))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), ScrapeError> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ScrapeError::write(path, e))?;

    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(ScrapeError::write(path, e)),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a char boundary near `max` bytes with
/// `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
