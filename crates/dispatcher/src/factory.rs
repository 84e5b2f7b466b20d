//! Sink construction from configuration

use contracts::{SinkConfig, SinkKind};
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::sinks::{LogSink, MqttSink, MqttSinkConfig};

/// Build the configured sink, connect it and start its worker.
///
/// For MQTT this waits for the broker handshake, so a refused or unreachable
/// broker is reported here rather than on the first publish.
#[instrument(name = "connect_sink", skip(config), fields(kind = ?config.kind))]
pub async fn connect_sink(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let handle = match config.kind {
        SinkKind::Mqtt => {
            let mqtt_config = MqttSinkConfig::from_sink_config(config)
                .map_err(|e| DispatcherError::sink_creation("mqtt", e.to_string()))?;
            let sink = MqttSink::connect(mqtt_config).await?;
            SinkHandle::spawn(sink, config.queue_capacity)
        }
        SinkKind::Log => SinkHandle::spawn(LogSink::new("log"), config.queue_capacity),
    };

    info!(
        sink = handle.name(),
        queue_capacity = config.queue_capacity,
        "Sink ready"
    );
    Ok(handle)
}
