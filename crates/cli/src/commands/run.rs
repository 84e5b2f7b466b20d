//! `run` command implementation.

use anyhow::{Context, Result};
use replay_engine::{shutdown_channel, ShutdownTrigger};
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::config::load_blueprint;
use crate::pipeline::{build_index, IndexSummary, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config).context("Failed to load configuration")?;

    info!(
        source = %blueprint.source.path.display(),
        start = %blueprint.source.interval.start,
        end = %blueprint.source.interval.end,
        broker = %blueprint.sink.broker,
        topic_prefix = %blueprint.sink.topic_prefix,
        "Configuration loaded"
    );

    // Dry run - index only, no connection
    if args.dry_run {
        let index = build_index(&blueprint).context("Failed to index sentence log")?;
        info!("Dry run mode - index built, exiting");
        println!();
        IndexSummary::from_index(&blueprint.source.path, &index).print();
        println!();
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let (trigger, signal) = shutdown_channel();
    let signal_task = tokio::spawn(forward_shutdown_signal(trigger));

    info!("Starting replay...");
    let result = pipeline.run(signal).await;
    signal_task.abort();

    let stats = result.context("Replay failed")?;
    info!(
        passes = stats.replay.passes,
        published = stats.delivery.published,
        failed = stats.delivery.failed,
        duration_secs = stats.duration.as_secs_f64(),
        "Replay finished"
    );
    stats.print_summary();

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then request a stop
async fn forward_shutdown_signal(trigger: ShutdownTrigger) {
    setup_shutdown_signal().await;
    warn!("Received shutdown signal, stopping replay...");
    trigger.trigger();
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
