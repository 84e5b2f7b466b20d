//! MessageSink trait - replay output interface
//!
//! The delivery endpoint (normally an MQTT broker client) is consumed through
//! this capability and never implemented by the scheduler itself.

use crate::{ContractError, OutboundMessage};

/// Message output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(MessageSink: Send)]
pub trait LocalMessageSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Hand one message to the endpoint with at-least-once semantics.
    ///
    /// Resolves once the endpoint has accepted the message for delivery; it
    /// does not wait for the remote acknowledgement.
    ///
    /// # Errors
    /// Returns publish error (should include the channel)
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), ContractError>;

    /// Wait for outstanding acknowledgements (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
