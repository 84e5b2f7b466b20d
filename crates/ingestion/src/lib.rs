//! # Ingestion
//!
//! Turns a recorded sentence log into an immutable per-second bucket index.
//!
//! Responsibilities:
//! - Scan raw text for checksum-framed sentences (`SentenceExtractor`)
//! - Recover each sentence's time of day against a reference date (`TimestampResolver`)
//! - Assign sentences to one-second buckets over the replay interval (`TimeBucketIndex`)
//!
//! ## Usage Example
//!
//! ```no_run
//! use contracts::Interval;
//! use ingestion::TimeBucketIndex;
//! use std::path::Path;
//!
//! let interval = Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:59:00").unwrap();
//! let index = TimeBucketIndex::load(Path::new("mosaic.txt"), interval).unwrap();
//! for (offset, bucket) in index.iter().enumerate() {
//!     println!("{} -> {} sentences", interval.second_at(offset), bucket.len());
//! }
//! ```

mod bucket_index;
mod error;
mod extractor;
mod timestamp;

// Re-exports
pub use bucket_index::{IndexStats, TimeBucketIndex};
pub use contracts::{Interval, Sentence};
pub use error::{IngestionError, Result};
pub use extractor::{extract_sentences, SentenceExtractor, TALKER_PREFIXES};
pub use timestamp::{parse_time_of_day, resolve_timestamp, TimestampResolver};
