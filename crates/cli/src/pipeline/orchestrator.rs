//! Pipeline orchestrator - index, connect, replay, drain.

use std::time::Instant;

use contracts::ReplayBlueprint;
use dispatcher::connect_sink;
use ingestion::TimeBucketIndex;
use observability::record_index_built;
use replay_engine::{ReplayScheduler, SchedulerConfig, ShutdownSignal, TokioPacer};
use tracing::{error, info, instrument, warn};

use super::{IndexSummary, PipelineStats};
use crate::error::{CliError, Result};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Effective replay configuration
    pub blueprint: ReplayBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Load the configured sentence log into a bucket index and record its stats.
#[instrument(name = "build_index", skip(blueprint), fields(path = %blueprint.source.path.display()))]
pub fn build_index(blueprint: &ReplayBlueprint) -> Result<TimeBucketIndex> {
    let index = TimeBucketIndex::from_source(&blueprint.source)?;
    let stats = index.stats();

    record_index_built(
        stats.candidates,
        stats.without_timestamp,
        stats.out_of_range,
        index.len(),
        stats.non_empty_buckets,
    );

    if stats.indexed == 0 {
        warn!(
            candidates = stats.candidates,
            "No sentence falls inside the interval, replay will only pace"
        );
    }

    Ok(index)
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Build the index, connect the sink and replay until `shutdown` fires
    /// or the configured number of passes completes.
    ///
    /// # Errors
    /// Unreadable source log or failed initial connection.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port).map_err(CliError::Metrics)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let index = build_index(blueprint)?;

        info!(
            broker = %blueprint.sink.broker,
            kind = ?blueprint.sink.kind,
            "Connecting sink..."
        );
        let handle = connect_sink(&blueprint.sink).await.map_err(|e| {
            error!(broker = %blueprint.sink.broker, error = %e, "Connection failed");
            CliError::connection(&blueprint.sink.broker, e)
        })?;

        let scheduler = ReplayScheduler::new(&index, SchedulerConfig::from_blueprint(blueprint));
        let replay = scheduler.run(&handle, &mut TokioPacer, shutdown).await;

        info!(queued = handle.metrics().queue_len(), "Draining sink");
        let delivery = handle.shutdown().await;

        Ok(PipelineStats {
            index: IndexSummary::from_index(&blueprint.source.path, &index),
            replay,
            delivery,
            duration: start_time.elapsed(),
        })
    }
}
