//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Errors raised while bringing a sink up
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The sink settings cannot be turned into a sink
    #[error("cannot build sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// The sink was built but its first connection failed
    #[error("sink unavailable: {0}")]
    Unavailable(#[from] ContractError),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
