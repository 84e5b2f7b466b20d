//! LogSink - writes every message to the log instead of a broker

use contracts::{ContractError, MessageSink, OutboundMessage};
use tracing::{debug, info, instrument};

/// Sink that logs messages for dry runs and debugging
pub struct LogSink {
    name: String,
    count: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }

    /// Messages logged so far
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl MessageSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_publish",
        skip(self, message),
        fields(sink = %self.name, channel = %message.channel)
    )]
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        self.count += 1;
        info!(
            sink = %self.name,
            channel = %message.channel,
            payload = %message.payload,
            "Message"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing buffered
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, messages = self.count, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Sentence;

    #[tokio::test]
    async fn test_log_sink_publish_counts() {
        let mut sink = LogSink::new("test_log");
        let message = OutboundMessage::new("producers/mycar/data/track", Sentence::from("$GPGGA*47"));

        assert!(sink.publish(&message).await.is_ok());
        assert!(sink.publish(&message).await.is_ok());
        assert_eq!(sink.count(), 2);
        assert!(sink.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
