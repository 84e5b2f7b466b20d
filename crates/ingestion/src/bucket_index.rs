//! Per-second bucket index
//!
//! Built once at startup, read-only afterwards. Bucket `i` holds every
//! sentence whose resolved timestamp falls in second `interval.start + i`,
//! in the order the sentences appeared in the log.

use std::path::Path;

use chrono::NaiveDateTime;
use contracts::{Interval, Sentence, SourceConfig};
use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use crate::error::{IngestionError, Result};
use crate::extractor::extract_sentences;
use crate::timestamp::TimestampResolver;

/// Counters collected while building an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Sentences matched by the extractor
    pub candidates: u64,
    /// Candidates without a usable time field
    pub without_timestamp: u64,
    /// Timestamped sentences outside the interval
    pub out_of_range: u64,
    /// Sentences placed into a bucket
    pub indexed: u64,
    /// Buckets holding at least one sentence
    pub non_empty_buckets: usize,
}

/// Immutable one-second buckets spanning the replay interval.
#[derive(Debug, Clone)]
pub struct TimeBucketIndex {
    interval: Interval,
    buckets: Vec<Vec<Sentence>>,
    stats: IndexStats,
}

impl TimeBucketIndex {
    /// Bucket already timestamped sentences, keeping iteration order within each bucket.
    ///
    /// Pairs outside the interval are discarded.
    pub fn build<I, S>(interval: Interval, pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, S)>,
        S: Into<Sentence>,
    {
        let mut buckets = vec![Vec::new(); interval.total_seconds()];
        let mut stats = IndexStats::default();

        for (timestamp, sentence) in pairs {
            stats.candidates += 1;
            match interval.offset_of(timestamp) {
                Some(offset) => {
                    buckets[offset].push(sentence.into());
                    stats.indexed += 1;
                }
                None => stats.out_of_range += 1,
            }
        }

        stats.non_empty_buckets = buckets.iter().filter(|b| !b.is_empty()).count();

        Self {
            interval,
            buckets,
            stats,
        }
    }

    /// Extract, timestamp and bucket every sentence found in `text`.
    #[instrument(name = "bucket_index_from_text", skip(text), fields(bytes = text.len()))]
    pub fn from_text(text: &str, interval: Interval) -> Self {
        let resolver = TimestampResolver::new(interval.reference_date());
        let mut without_timestamp = 0u64;

        let pairs = extract_sentences(text).filter_map(|sentence| match resolver.resolve(sentence) {
            Some(ts) => Some((ts, sentence)),
            None => {
                without_timestamp += 1;
                trace!(sentence, "no timestamp, skipped");
                None
            }
        });

        let mut index = Self::build(interval, pairs);
        index.stats.candidates += without_timestamp;
        index.stats.without_timestamp = without_timestamp;

        debug!(
            candidates = index.stats.candidates,
            indexed = index.stats.indexed,
            without_timestamp = index.stats.without_timestamp,
            out_of_range = index.stats.out_of_range,
            "Bucket index built"
        );

        index
    }

    /// Read a sentence log from disk and index it.
    ///
    /// Invalid UTF-8 sequences are replaced, not rejected.
    ///
    /// # Errors
    /// `FileAccess` when the file cannot be read.
    #[instrument(name = "bucket_index_load", skip(path, interval), fields(path = %path.display()))]
    pub fn load(path: &Path, interval: Interval) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|source| IngestionError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&raw);
        let index = Self::from_text(&text, interval);

        info!(
            path = %path.display(),
            buckets = index.len(),
            sentences = index.stats.indexed,
            non_empty_buckets = index.stats.non_empty_buckets,
            "Loaded sentence log"
        );

        Ok(index)
    }

    /// Parse the configured interval and load the configured log.
    pub fn from_source(source: &SourceConfig) -> Result<Self> {
        let interval = source.interval.to_interval()?;
        Self::load(&source.path, interval)
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Number of buckets, always `interval.total_seconds()`
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Never true: an interval covers at least one second
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket(&self, offset: usize) -> Option<&[Sentence]> {
        self.buckets.get(offset).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[Sentence]> + '_ {
        self.buckets.iter().map(Vec::as_slice)
    }

    /// Total sentences across all buckets
    pub fn message_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}
