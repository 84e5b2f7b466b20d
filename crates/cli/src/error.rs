//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] contracts::ContractError),

    /// Sentence log could not be indexed
    #[error("Failed to build sentence index: {0}")]
    Index(#[from] ingestion::IngestionError),

    /// Initial sink connection failed
    #[error("Failed to connect to {broker}: {source}")]
    Connection {
        broker: String,
        #[source]
        source: dispatcher::DispatcherError,
    },

    /// Metrics exporter could not start
    #[error("Failed to start metrics endpoint: {0:#}")]
    Metrics(anyhow::Error),

    /// Configuration file named explicitly but missing
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },
}

impl CliError {
    pub fn connection(broker: impl Into<String>, source: dispatcher::DispatcherError) -> Self {
        Self::Connection {
            broker: broker.into(),
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
