//! OutboundMessage - what the scheduler hands to a sink

use serde::Serialize;

use crate::Sentence;

/// A sentence paired with the destination channel it is published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Full destination, `<prefix>/<suffix>`
    pub channel: String,
    /// Sentence text, published verbatim
    pub payload: Sentence,
}

impl OutboundMessage {
    pub fn new(channel: impl Into<String>, payload: Sentence) -> Self {
        Self {
            channel: channel.into(),
            payload,
        }
    }
}
