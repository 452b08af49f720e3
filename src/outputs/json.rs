//! Batched JSON output.
//!
//! Scraped records are buffered in memory and written to a single JSON array
//! file in batches. Each flush reads the array already on disk, appends the
//! batch and rewrites the whole file, so after every flush the file is a
//! complete, valid array of everything flushed so far.
//!
//! A file left by an earlier run is not read: the first flush of a run
//! replaces it. Until then it stays untouched, so a run that fails before
//! its first flush keeps the previous output.
//!
//! # Atomic Writes
//!
//! The new array is written to `<file>.tmp` first and then renamed over the
//! output file. A crash mid-write leaves the previous state intact.

use crate::error::ScrapeError;
use crate::models::ArticleRecord;
use crate::observer::CrawlObserver;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Owns the output file for the duration of a run.
pub struct BatchWriter {
    path: PathBuf,
    threshold: usize,
    pending: Vec<ArticleRecord>,
    written: usize,
    /// No flush has happened yet in this run.
    fresh: bool,
    observer: Arc<dyn CrawlObserver>,
}

impl BatchWriter {
    /// Take ownership of `path`. An existing file is replaced on the first flush.
    ///
    /// # Arguments
    ///
    /// * `path` - Output JSON file
    /// * `threshold` - Number of buffered records that triggers a flush
    /// * `observer` - Receives a `batch_flushed` event per flush
    pub fn create(path: &Path, threshold: usize, observer: Arc<dyn CrawlObserver>) -> Self {
        Self {
            path: path.to_path_buf(),
            threshold: threshold.max(1),
            pending: Vec::with_capacity(threshold.max(1)),
            written: 0,
            fresh: true,
            observer,
        }
    }

    /// Records flushed to disk so far.
    #[cfg(test)]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Records waiting for the next flush.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Buffer one record, flushing when the batch is full.
    pub async fn append(&mut self, record: ArticleRecord) -> Result<(), ScrapeError> {
        self.pending.push(record);
        if self.pending.len() >= self.threshold {
            self.flush().await?;
        }
        Ok(())
    }

    /// Buffer several records in order.
    pub async fn append_all(
        &mut self,
        records: impl IntoIterator<Item = ArticleRecord>,
    ) -> Result<(), ScrapeError> {
        for record in records {
            self.append(record).await?;
        }
        Ok(())
    }

    /// Merge buffered records into the output file. No-op when nothing is buffered.
    #[instrument(
        level = "info",
        skip_all,
        fields(path = %self.path.display(), batch = self.pending.len())
    )]
    pub async fn flush(&mut self) -> Result<(), ScrapeError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut all = if self.fresh {
            Vec::new()
        } else {
            self.read_existing().await?
        };
        let batch = self.pending.len();
        all.extend(self.pending.iter().cloned());
        self.write_atomic(&all).await?;

        self.pending.clear();
        self.fresh = false;
        self.written = all.len();
        self.observer.batch_flushed(&self.path, batch, self.written);
        Ok(())
    }

    /// Flush what is left and make sure the output file exists, even if empty.
    pub async fn finish(mut self) -> Result<PathBuf, ScrapeError> {
        self.flush().await?;
        if self.fresh {
            debug!("No records flushed; writing empty array");
            self.write_atomic(&[]).await?;
        }
        info!(path = %self.path.display(), records = self.written, "Output file complete");
        Ok(self.path)
    }

    async fn read_existing(&self) -> Result<Vec<ArticleRecord>, ScrapeError> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ScrapeError::write(&self.path, e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(ScrapeError::write(&self.path, e)),
        }
    }

    async fn write_atomic(&self, records: &[ArticleRecord]) -> Result<(), ScrapeError> {
        let json = to_pretty_json(records).map_err(|e| ScrapeError::write(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| ScrapeError::write(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ScrapeError::write(&self.path, e))
    }
}

/// Serialize with 4-space indentation.
fn to_pretty_json(records: &[ArticleRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(buf)
}
