//! MemorySink - records messages in memory

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{ContractError, MessageSink, OutboundMessage};

/// Sink that keeps every accepted message, in order.
///
/// Clones share the same storage, so a clone kept by the caller can inspect
/// what the worker published after the sink was moved into a
/// [`SinkHandle`](crate::SinkHandle).
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    messages: Arc<Mutex<Vec<OutboundMessage>>>,
    fail_on_channel: Option<String>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reject every message addressed to `channel`
    pub fn failing_on(mut self, channel: impl Into<String>) -> Self {
        self.fail_on_channel = Some(channel.into());
        self
    }

    /// Copy of the messages accepted so far
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl MessageSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        if self.fail_on_channel.as_deref() == Some(message.channel.as_str()) {
            return Err(ContractError::sink_publish(
                &self.name,
                &message.channel,
                "rejected by memory sink",
            ));
        }
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
