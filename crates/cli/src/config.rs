//! Effective configuration: file (or defaults) plus command-line overrides.

use config_loader::ConfigLoader;
use contracts::ReplayBlueprint;
use tracing::info;

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

/// Load the configuration named by `args`, apply overrides and re-validate.
pub fn load_blueprint(args: &ConfigArgs) -> Result<ReplayBlueprint> {
    if let Some(path) = &args.config {
        if !path.exists() {
            return Err(CliError::ConfigNotFound { path: path.clone() });
        }
    }

    let mut blueprint = ConfigLoader::load_or_default(args.config.as_deref())?;
    if apply_overrides(&mut blueprint, args) {
        config_loader::validate(&blueprint)?;
    }
    Ok(blueprint)
}

/// Returns true if any field was overridden.
pub fn apply_overrides(blueprint: &mut ReplayBlueprint, args: &ConfigArgs) -> bool {
    let mut changed = false;

    if let Some(broker) = &args.broker {
        info!(broker = %broker, "Overriding broker from CLI");
        blueprint.sink.broker = broker.clone();
        changed = true;
    }
    if let Some(username) = &args.username {
        blueprint.sink.username = username.clone();
        changed = true;
    }
    if let Some(password) = &args.password {
        blueprint.sink.password = password.clone();
        changed = true;
    }
    if let Some(topic) = &args.topic {
        info!(topic = %topic, "Overriding topic prefix from CLI");
        blueprint.sink.topic_prefix = topic.clone();
        changed = true;
    }
    if let Some(kind) = args.sink {
        blueprint.sink.kind = kind.into();
        changed = true;
    }
    if let Some(file) = &args.file {
        info!(file = %file.display(), "Overriding sentence log from CLI");
        blueprint.source.path = file.clone();
        changed = true;
    }
    if let Some(start) = &args.start {
        blueprint.source.interval.start = start.clone();
        changed = true;
    }
    if let Some(end) = &args.end {
        blueprint.source.interval.end = end.clone();
        changed = true;
    }
    if let Some(pacing_ms) = args.pacing_ms {
        blueprint.replay.pacing_ms = pacing_ms;
        changed = true;
    }
    if let Some(passes) = args.passes {
        blueprint.replay.max_passes = Some(passes);
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SinkArg;
    use contracts::{ContractError, SinkKind};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[sink]\ntopic_prefix = \"producers/truck/data\"").unwrap();

        let args = ConfigArgs {
            config: Some(file.path().to_path_buf()),
            ..ConfigArgs::default()
        };
        let blueprint = load_blueprint(&args).unwrap();
        assert_eq!(blueprint.sink.topic_prefix, "producers/truck/data");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut blueprint = ReplayBlueprint::default();
        let args = ConfigArgs {
            broker: Some("tcp://10.1.1.1".into()),
            username: Some(String::new()),
            file: Some(PathBuf::from("/data/drive.txt")),
            passes: Some(3),
            sink: Some(SinkArg::Log),
            ..ConfigArgs::default()
        };

        assert!(apply_overrides(&mut blueprint, &args));
        assert_eq!(blueprint.sink.broker, "tcp://10.1.1.1");
        assert!(!blueprint.sink.uses_auth());
        assert_eq!(blueprint.sink.kind, SinkKind::Log);
        assert_eq!(blueprint.source.path, PathBuf::from("/data/drive.txt"));
        assert_eq!(blueprint.replay.max_passes, Some(3));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let args = ConfigArgs {
            config: Some(file.path().to_path_buf()),
            start: Some("2023-09-21 08:00:00".into()),
            end: Some("2023-09-21 07:00:00".into()),
            ..ConfigArgs::default()
        };
        let err = load_blueprint(&args).unwrap_err();
        assert!(matches!(err, CliError::Config(ContractError::ConfigValidation { .. })));
    }

    #[test]
    fn test_missing_explicit_config() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/nmea-replay.toml")),
            ..ConfigArgs::default()
        };
        assert!(matches!(
            load_blueprint(&args),
            Err(CliError::ConfigNotFound { .. })
        ));
    }
}
