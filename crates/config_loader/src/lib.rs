//! # Config Loader
//!
//! Reads a replay configuration from TOML or JSON, fills in defaults and
//! validates it into a [`ReplayBlueprint`].
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("nmea-replay.toml")).unwrap();
//! println!("Broker: {}", blueprint.sink.broker);
//! ```

mod parser;
mod validator;

pub use contracts::ReplayBlueprint;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::ContractError;
use std::path::Path;
use tracing::{debug, instrument};

/// Configuration file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "nmea-replay.toml";

/// Entry points for loading and writing [`ReplayBlueprint`]s
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate the file at `path`, format chosen by extension.
    #[instrument(name = "config_load", skip(path), fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<ReplayBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ContractError::file_access(path, e))?;
        let blueprint = Self::load_from_str(&content, format)?;
        debug!(?format, "Configuration loaded");
        Ok(blueprint)
    }

    /// Parse and validate `content`.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ReplayBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load `path` when given; otherwise [`DEFAULT_CONFIG_FILE`] if it
    /// exists, else the built-in defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<ReplayBlueprint, ContractError> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load_from_path(fallback);
        }

        debug!("No configuration file, using defaults");
        let blueprint = ReplayBlueprint::default();
        validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Render as TOML. The sink password is never written out.
    pub fn to_toml(blueprint: &ReplayBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot render TOML: {e}")))
    }

    /// Render as JSON. The sink password is never written out.
    pub fn to_json(blueprint: &ReplayBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("cannot render JSON: {e}")))
    }
}
