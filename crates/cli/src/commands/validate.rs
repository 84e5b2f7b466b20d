//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
use contracts::{BrokerAddress, ReplayBlueprint, SinkKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source: String,
    interval_seconds: usize,
    sink: String,
    broker: String,
    topic_prefix: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);
    info!(config = %result.config_path, valid = result.valid, "Validated configuration");

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = match &args.config {
        Some(path) => path.display().to_string(),
        None => format!("{DEFAULT_CONFIG_FILE} (or built-in defaults)"),
    };

    if let Some(path) = &args.config {
        if !path.exists() {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(format!("File not found: {}", path.display())),
                warnings: None,
                summary: None,
            };
        }
    }

    match ConfigLoader::load_or_default(args.config.as_deref()) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &ReplayBlueprint) -> ConfigSummary {
    let interval_seconds = blueprint
        .source
        .interval
        .to_interval()
        .map(|i| i.total_seconds())
        .unwrap_or_default();
    let broker = BrokerAddress::parse(&blueprint.sink.broker)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| blueprint.sink.broker.clone());

    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        source: blueprint.source.path.display().to_string(),
        interval_seconds,
        sink: format!("{:?}", blueprint.sink.kind),
        broker,
        topic_prefix: blueprint.sink.topic_prefix.clone(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ReplayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.source.path.exists() {
        warnings.push(format!(
            "Sentence log '{}' does not exist yet",
            blueprint.source.path.display()
        ));
    }

    if blueprint.sink.kind == SinkKind::Log {
        warnings.push("sink.kind is 'log' - nothing will be published to a broker".to_string());
    } else if !blueprint.sink.uses_auth() {
        warnings.push("sink.username is empty - connecting anonymously".to_string());
    }

    if blueprint.sink.drain_timeout_secs == 0 {
        warnings.push(
            "sink.drain_timeout_secs is 0 - the broker session is cut without a clean disconnect"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {}", summary.source);
            println!("  Interval: {} s", summary.interval_seconds);
            println!("  Sink: {} ({})", summary.sink, summary.broker);
            println!("  Topic prefix: {}", summary.topic_prefix);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
