//! Error types for the scraper.
//!
//! Every fatal condition in a run is a [`ScrapeError`]. Per-article problems on
//! detail pages are not errors; they surface as
//! [`SkipReason`](crate::models::SkipReason) instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// HTTP status codes worth retrying.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Why a single HTTP request did not yield a body.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchFailure {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchFailure::Status(code) => RETRY_STATUSES.contains(code),
            FetchFailure::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch data from {url}: {cause}")]
    Fetch {
        url: String,
        #[source]
        cause: FetchFailure,
    },

    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("error writing to file {}: {cause}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
}

impl ScrapeError {
    pub fn write(path: impl Into<PathBuf>, cause: impl Into<io::Error>) -> Self {
        ScrapeError::Write {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for code in RETRY_STATUSES {
            assert!(FetchFailure::Status(code).is_transient());
        }
        assert!(!FetchFailure::Status(404).is_transient());
        assert!(!FetchFailure::Status(403).is_transient());
    }

    #[test]
    fn test_write_error_message_names_path() {
        let err = ScrapeError::write(
            "/tmp/out/okx_news_20201001_20201030.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("okx_news_20201001_20201030.json"));
        assert!(msg.contains("denied"));
    }
}
