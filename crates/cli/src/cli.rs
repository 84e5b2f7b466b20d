//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::SinkKind;
use std::path::PathBuf;

/// NMEA Replay - replays a recorded sentence log to an MQTT broker
#[derive(Parser, Debug)]
#[command(
    name = "nmea-replay",
    author,
    version,
    about = "Replay recorded NMEA sentences to an MQTT broker in real time",
    long_about = "Reads a recorded NMEA sentence log, keeps the sentences whose time of day \n\
                  falls inside the configured interval, and publishes them second by second \n\
                  to per-sensor MQTT topics, looping until stopped."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "NMEA_REPLAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "NMEA_REPLAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay the configured interval until stopped
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Configuration source and per-field overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "NMEA_REPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override broker address (`tcp://host[:port]` or `ssl://host[:port]`)
    #[arg(long, env = "NMEA_REPLAY_BROKER")]
    pub broker: Option<String>,

    /// Override broker username (empty string disables authentication)
    #[arg(long, env = "NMEA_REPLAY_USERNAME")]
    pub username: Option<String>,

    /// Override broker password
    #[arg(long, env = "NMEA_REPLAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Override destination topic prefix
    #[arg(long, env = "NMEA_REPLAY_TOPIC")]
    pub topic: Option<String>,

    /// Override sentence log path
    #[arg(long, env = "NMEA_REPLAY_FILE")]
    pub file: Option<PathBuf>,

    /// Override interval start (`YYYY-MM-DD HH:MM:SS`)
    #[arg(long)]
    pub start: Option<String>,

    /// Override interval end (`YYYY-MM-DD HH:MM:SS`)
    #[arg(long)]
    pub end: Option<String>,

    /// Override delay between buckets in milliseconds
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    /// Stop after this many passes over the interval
    #[arg(long)]
    pub passes: Option<u64>,

    /// Override sink type
    #[arg(long, value_enum)]
    pub sink: Option<SinkArg>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Build the index, print its statistics and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "NMEA_REPLAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate (defaults apply when absent)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also load the sentence log and show index statistics
    #[arg(long)]
    pub index: bool,
}

/// Sink type as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkArg {
    /// MQTT broker
    Mqtt,
    /// Log messages only
    Log,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Mqtt => SinkKind::Mqtt,
            SinkArg::Log => SinkKind::Log,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "nmea-replay",
            "run",
            "--broker",
            "ssl://broker.local",
            "--topic",
            "producers/truck/data",
            "--passes",
            "2",
            "--sink",
            "log",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config.broker.as_deref(), Some("ssl://broker.local"));
        assert_eq!(args.config.topic.as_deref(), Some("producers/truck/data"));
        assert_eq!(args.config.passes, Some(2));
        assert_eq!(args.config.sink, Some(SinkArg::Log));
        assert!(args.dry_run);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["nmea-replay", "-q", "-v", "info"]).is_err());
    }
}
