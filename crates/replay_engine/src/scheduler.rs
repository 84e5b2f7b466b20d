//! Bucket-by-bucket replay loop

use std::time::Duration;

use contracts::{OutboundMessage, ReplayBlueprint};
use dispatcher::SinkHandle;
use ingestion::TimeBucketIndex;
use observability::{record_bucket_replayed, record_pass_completed};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::pacer::Pacer;
use crate::routing::{channel_suffix, destination_channel};
use crate::shutdown::ShutdownSignal;

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Channel prefix, the `[id]` suffix is appended per message
    pub topic_prefix: String,
    /// Pause after each bucket
    pub pacing: Duration,
    /// Suffix for sentences without a tag
    pub default_channel: String,
    /// Stop after this many passes (`None` = until stopped)
    pub max_passes: Option<u64>,
}

impl SchedulerConfig {
    pub fn from_blueprint(blueprint: &ReplayBlueprint) -> Self {
        Self {
            topic_prefix: blueprint.sink.topic_prefix.clone(),
            pacing: blueprint.replay.pacing(),
            default_channel: blueprint.replay.default_channel.clone(),
            max_passes: blueprint.replay.max_passes,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_blueprint(&ReplayBlueprint::default())
    }
}

/// Counters for a finished (or stopped) replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Complete passes over the interval
    pub passes: u64,
    /// Buckets whose messages were handed to the sink
    pub buckets: u64,
    /// Pauses that ran to completion
    pub pacing_delays: u64,
    /// Messages accepted by the sink queue
    pub dispatched: u64,
    /// Messages the sink queue refused
    pub rejected: u64,
}

/// Replays an index against a sink, one bucket per pacing unit.
///
/// The index is borrowed read-only for the whole run.
#[derive(Debug)]
pub struct ReplayScheduler<'a> {
    index: &'a TimeBucketIndex,
    config: SchedulerConfig,
}

impl<'a> ReplayScheduler<'a> {
    pub fn new(index: &'a TimeBucketIndex, config: SchedulerConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Hand every message of bucket `offset` to the sink in stored order.
    ///
    /// Never waits for the sink. Returns `(dispatched, rejected)`.
    pub fn dispatch_bucket(&self, offset: usize, handle: &SinkHandle) -> (u64, u64) {
        let Some(bucket) = self.index.bucket(offset) else {
            return (0, 0);
        };

        let mut dispatched = 0;
        let mut rejected = 0;
        for sentence in bucket {
            let suffix = channel_suffix(sentence.as_str(), &self.config.default_channel);
            let channel = destination_channel(&self.config.topic_prefix, suffix);
            if handle.try_send(OutboundMessage::new(channel, sentence.clone())) {
                dispatched += 1;
            } else {
                rejected += 1;
            }
        }
        (dispatched, rejected)
    }

    /// Loop over all buckets until stopped or `max_passes` is reached.
    ///
    /// The stop signal is checked before each bucket and raced against every
    /// pause, so at most one bucket is dispatched after a stop request.
    #[instrument(
        name = "replay_scheduler_run",
        skip_all,
        fields(buckets = self.index.len(), sink = handle.name())
    )]
    pub async fn run<P: Pacer>(
        &self,
        handle: &SinkHandle,
        pacer: &mut P,
        mut shutdown: ShutdownSignal,
    ) -> ReplayStats {
        let mut stats = ReplayStats::default();
        let interval = self.index.interval();

        info!(
            start = %interval.start(),
            end = %interval.end(),
            messages = self.index.message_count(),
            pacing = ?self.config.pacing,
            "Starting replay"
        );

        'replay: loop {
            for offset in 0..self.index.len() {
                if shutdown.is_stopped() {
                    break 'replay;
                }

                let (dispatched, rejected) = self.dispatch_bucket(offset, handle);
                stats.dispatched += dispatched;
                stats.rejected += rejected;
                stats.buckets += 1;
                record_bucket_replayed(offset, (dispatched + rejected) as usize);
                debug!(
                    second = %interval.second_at(offset),
                    offset,
                    dispatched,
                    rejected,
                    "Bucket replayed"
                );

                tokio::select! {
                    _ = pacer.pause(self.config.pacing) => stats.pacing_delays += 1,
                    _ = shutdown.stopped() => break 'replay,
                }
            }

            stats.passes += 1;
            record_pass_completed(stats.passes);
            info!(pass = stats.passes, dispatched = stats.dispatched, "Pass complete");

            if self.config.max_passes.is_some_and(|max| stats.passes >= max) {
                break;
            }
        }

        info!(
            passes = stats.passes,
            buckets = stats.buckets,
            dispatched = stats.dispatched,
            rejected = stats.rejected,
            "Replay stopped"
        );
        stats
    }
}
