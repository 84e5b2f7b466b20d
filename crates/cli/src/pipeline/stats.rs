//! Pipeline statistics.

use std::path::Path;
use std::time::Duration;

use dispatcher::DeliverySnapshot;
use ingestion::{IndexStats, TimeBucketIndex};
use observability::RunningStats;
use replay_engine::ReplayStats;
use serde::Serialize;

/// What the bucket index holds
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub path: String,
    pub start: String,
    pub end: String,
    pub buckets: usize,
    pub stats: IndexStats,
    /// Sentences per non-empty bucket
    pub bucket_sizes: String,
}

impl IndexSummary {
    pub fn from_index(path: &Path, index: &TimeBucketIndex) -> Self {
        let interval = index.interval();
        let sizes: RunningStats = index
            .iter()
            .filter(|bucket| !bucket.is_empty())
            .map(|bucket| bucket.len() as f64)
            .collect();

        Self {
            path: path.display().to_string(),
            start: interval.start().to_string(),
            end: interval.end().to_string(),
            buckets: index.len(),
            stats: *index.stats(),
            bucket_sizes: sizes.summary().to_string(),
        }
    }

    pub fn print(&self) {
        println!("📄 Sentence Log");
        println!("   ├─ Path: {}", self.path);
        println!("   ├─ Interval: {} .. {}", self.start, self.end);
        println!("   ├─ Buckets: {} ({} non-empty)", self.buckets, self.stats.non_empty_buckets);
        println!("   ├─ Sentences found: {}", self.stats.candidates);
        println!("   ├─ Without timestamp: {}", self.stats.without_timestamp);
        println!("   ├─ Outside interval: {}", self.stats.out_of_range);
        println!("   ├─ Indexed: {}", self.stats.indexed);
        println!("   └─ Per bucket: {}", self.bucket_sizes);
    }
}

/// Statistics from a replay run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub index: IndexSummary,
    pub replay: ReplayStats,
    pub delivery: DeliverySnapshot,
    pub duration: Duration,
}

impl PipelineStats {
    /// Messages published per wall-clock second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.delivery.published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Replay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        self.index.print();

        println!("\n📊 Replay");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Passes completed: {}", self.replay.passes);
        println!("   ├─ Buckets replayed: {}", self.replay.buckets);
        println!("   ├─ Messages queued: {}", self.replay.dispatched);
        println!("   └─ Messages rejected by queue: {}", self.replay.rejected);

        println!("\n📤 Delivery");
        println!("   ├─ Published: {}", self.delivery.published);
        println!("   ├─ Failed: {}", self.delivery.failed);
        println!("   ├─ Dropped: {}", self.delivery.dropped);
        println!("   └─ Rate: {:.2} msg/s", self.rate());

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Interval;

    #[test]
    fn test_index_summary_counts() {
        let interval = Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:41:05").unwrap();
        let index = TimeBucketIndex::from_text(
            "$GPGGA,074056.00*47 $GPGGA,074056.50*47 $GPGGA,074059.00*47",
            interval,
        );
        let summary = IndexSummary::from_index(Path::new("mosaic.txt"), &index);

        assert_eq!(summary.buckets, 10);
        assert_eq!(summary.stats.indexed, 3);
        assert_eq!(summary.stats.non_empty_buckets, 2);
        assert!(summary.bucket_sizes.contains("n=2"), "got {}", summary.bucket_sizes);
        assert_eq!(summary.start, "2023-09-21 07:40:56");
    }

    #[test]
    fn test_rate_with_zero_duration() {
        let interval = Interval::parse("2023-09-21 07:40:56", "2023-09-21 07:40:56").unwrap();
        let index = TimeBucketIndex::from_text("", interval);
        let stats = PipelineStats {
            index: IndexSummary::from_index(Path::new("x"), &index),
            replay: ReplayStats::default(),
            delivery: DeliverySnapshot::default(),
            duration: Duration::ZERO,
        };
        assert_eq!(stats.rate(), 0.0);
    }
}
