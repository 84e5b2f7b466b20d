//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{BrokerAddress, ReplayBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::config::load_blueprint;
use crate::pipeline::{build_index, IndexSummary};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    sink: SinkInfo,
    replay: ReplayInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexSummary>,
}

#[derive(Serialize)]
struct SourceInfo {
    path: String,
    start: String,
    end: String,
    total_seconds: usize,
}

#[derive(Serialize)]
struct SinkInfo {
    kind: String,
    broker: String,
    tls: bool,
    authenticated: bool,
    topic_prefix: String,
    client_id: String,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct ReplayInfo {
    pacing_ms: u64,
    default_channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_passes: Option<u64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config).context("Failed to load configuration")?;
    info!(source = %blueprint.source.path.display(), "Loading configuration info");

    let index = if args.index {
        let index = build_index(&blueprint).context("Failed to index sentence log")?;
        Some(IndexSummary::from_index(&blueprint.source.path, &index))
    } else {
        None
    };

    let info = build_config_info(&blueprint, index)?;
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &ReplayBlueprint, index: Option<IndexSummary>) -> Result<ConfigInfo> {
    let interval = blueprint.source.interval.to_interval()?;
    let address = BrokerAddress::parse(&blueprint.sink.broker)?;

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: SourceInfo {
            path: blueprint.source.path.display().to_string(),
            start: interval.start().to_string(),
            end: interval.end().to_string(),
            total_seconds: interval.total_seconds(),
        },
        sink: SinkInfo {
            kind: format!("{:?}", blueprint.sink.kind),
            broker: address.to_string(),
            tls: address.tls,
            authenticated: blueprint.sink.uses_auth(),
            topic_prefix: blueprint.sink.topic_prefix.clone(),
            client_id: blueprint.sink.client_id.clone(),
            queue_capacity: blueprint.sink.queue_capacity,
        },
        replay: ReplayInfo {
            pacing_ms: blueprint.replay.pacing_ms,
            default_channel: blueprint.replay.default_channel.clone(),
            max_passes: blueprint.replay.max_passes,
        },
        index,
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  NMEA Replay Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Source");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Path: {}", info.source.path);
    println!("   ├─ Start: {}", info.source.start);
    println!("   ├─ End: {}", info.source.end);
    println!("   └─ Seconds: {}", info.source.total_seconds);

    println!("\n📤 Sink");
    println!("   ├─ Kind: {}", info.sink.kind);
    println!(
        "   ├─ Broker: {}{}",
        info.sink.broker,
        if info.sink.tls { " (TLS)" } else { "" }
    );
    println!(
        "   ├─ Auth: {}",
        if info.sink.authenticated { "username/password" } else { "anonymous" }
    );
    println!("   ├─ Client id: {}", info.sink.client_id);
    println!("   ├─ Queue capacity: {}", info.sink.queue_capacity);
    println!("   └─ Topic: {}/<id|{}>", info.sink.topic_prefix, info.replay.default_channel);

    println!("\n⏱  Replay");
    println!("   ├─ Pacing: {} ms", info.replay.pacing_ms);
    match info.replay.max_passes {
        Some(passes) => println!("   └─ Passes: {}", passes),
        None => println!("   └─ Passes: until stopped"),
    }

    if let Some(ref index) = info.index {
        println!();
        index.print();
    }

    println!();
}
