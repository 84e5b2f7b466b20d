//! MqttSink - publishes sentences to an MQTT broker at QoS 1
//!
//! The rumqttc event loop runs on its own task after the initial handshake.
//! `publish` resolves only once the broker has answered that packet with a
//! PUBACK, so the sink worker reports real delivery outcomes.
//!
//! Packet ids are assigned by the event loop, not by `publish`. Waiting
//! publishes are therefore queued in request order and bound to a packet id
//! when the matching `Outgoing::Publish` event comes by.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use contracts::{BrokerAddress, ContractError, MessageSink, OutboundMessage, SinkConfig};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    Transport,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

const SINK_NAME: &str = "mqtt";
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Connection settings for [`MqttSink`]
#[derive(Debug, Clone)]
pub struct MqttSinkConfig {
    pub address: BrokerAddress,
    pub client_id: String,
    /// Username and password, `None` for anonymous sessions
    pub credentials: Option<(String, String)>,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    /// Longest wait for the PUBACK of one publish
    pub ack_timeout: Duration,
    /// Longest wait for the session to close on shutdown
    pub drain_timeout: Duration,
    /// Capacity of the client request channel
    pub request_capacity: usize,
}

impl MqttSinkConfig {
    /// Resolve the broker URL and credentials from a [`SinkConfig`]
    pub fn from_sink_config(config: &SinkConfig) -> Result<Self, ContractError> {
        let address = BrokerAddress::parse(&config.broker)?;
        let credentials = config
            .uses_auth()
            .then(|| (config.username.clone(), config.password.clone()));

        Ok(Self {
            address,
            client_id: config.client_id.clone(),
            credentials,
            keep_alive: config.keep_alive(),
            connect_timeout: config.connect_timeout(),
            ack_timeout: config.ack_timeout(),
            drain_timeout: config.drain_timeout(),
            request_capacity: config.queue_capacity.clamp(10, 1024),
        })
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options =
            MqttOptions::new(&self.client_id, &self.address.host, self.address.port);
        options.set_keep_alive(self.keep_alive);
        // A clean session drops unacknowledged packets on reconnect, so a
        // packet id seen after a connection loss always belongs to a new publish
        options.set_clean_session(true);
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username, password);
        }
        if self.address.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        options
    }
}

type AckSender = oneshot::Sender<Result<(), String>>;

/// Publishes waiting for their PUBACK
#[derive(Debug, Default)]
struct PendingAcks {
    /// Handed to the client, no packet id yet
    queued: VecDeque<AckSender>,
    /// Written to the broker, keyed by packet id
    in_flight: HashMap<u16, AckSender>,
    /// Set once the sink is closing; connection errors then end the loop
    closing: bool,
}

impl PendingAcks {
    fn assign(&mut self, pkid: u16) {
        match self.queued.pop_front() {
            Some(ack) => {
                self.in_flight.insert(pkid, ack);
            }
            None => debug!(pkid, "Publish without a waiting sender"),
        }
    }

    fn acknowledge(&mut self, pkid: u16) {
        if let Some(ack) = self.in_flight.remove(&pkid) {
            // The publisher may have timed out already
            let _ = ack.send(Ok(()));
        }
    }

    /// Fail every packet already written; queued requests survive a reconnect
    fn fail_in_flight(&mut self, reason: &str) {
        for (_, ack) in self.in_flight.drain() {
            let _ = ack.send(Err(reason.to_string()));
        }
    }
}

type SharedAcks = Arc<Mutex<PendingAcks>>;

fn lock(acks: &SharedAcks) -> MutexGuard<'_, PendingAcks> {
    acks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sink backed by a connected MQTT session
pub struct MqttSink {
    name: String,
    config: MqttSinkConfig,
    client: AsyncClient,
    acks: SharedAcks,
    driver: Option<JoinHandle<()>>,
}

impl MqttSink {
    /// Open the session and wait for the broker's CONNACK.
    ///
    /// # Errors
    /// `SinkConnection` when the broker is unreachable, refuses the session
    /// or does not answer within `connect_timeout`.
    #[instrument(
        name = "mqtt_sink_connect",
        skip(config),
        fields(broker = %config.address, client_id = %config.client_id)
    )]
    pub async fn connect(config: MqttSinkConfig) -> Result<Self, ContractError> {
        let (client, mut eventloop) =
            AsyncClient::new(config.mqtt_options(), config.request_capacity);

        match timeout(config.connect_timeout, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Err(ContractError::sink_connection(SINK_NAME, message)),
            Err(_) => {
                return Err(ContractError::sink_connection(
                    SINK_NAME,
                    format!(
                        "no answer from {} within {:?}",
                        config.address, config.connect_timeout
                    ),
                ));
            }
        }

        info!(broker = %config.address, client_id = %config.client_id, "Connected to broker");

        let acks = SharedAcks::default();
        let driver = tokio::spawn(drive_event_loop(eventloop, Arc::clone(&acks)));

        Ok(Self {
            name: SINK_NAME.to_string(),
            config,
            client,
            acks,
            driver: Some(driver),
        })
    }

    fn publish_error(&self, message: &OutboundMessage, reason: impl Into<String>) -> ContractError {
        ContractError::sink_publish(&self.name, &message.channel, reason)
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    code => Err(format!("broker refused connection: {code:?}")),
                };
            }
            Ok(event) => debug!(?event, "Event before CONNACK"),
            Err(e) => return Err(e.to_string()),
        }
    }
}

/// Keep the session alive, match acknowledgements and reconnect after errors.
///
/// Runs until the client sends DISCONNECT or the connection ends while closing.
async fn drive_event_loop(mut eventloop: EventLoop, acks: SharedAcks) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => lock(&acks).assign(pkid),
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                debug!(pkid = ack.pkid, "PUBACK");
                lock(&acks).acknowledge(ack.pkid);
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Reconnected to broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Disconnect sent, event loop stopping");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let closing = {
                    let mut acks = lock(&acks);
                    acks.fail_in_flight(&format!("connection lost before PUBACK: {e}"));
                    acks.closing
                };
                if closing {
                    debug!(error = %e, "Event loop closed");
                    break;
                }
                warn!(error = %e, "Broker connection lost, retrying");
                sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

impl MessageSink for MqttSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mqtt_sink_publish",
        skip(self, message),
        fields(channel = %message.channel)
    )]
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        // Queued before the request so the event loop can never see the
        // packet first
        lock(&self.acks).queued.push_back(ack_tx);

        let handed_off = self
            .client
            .publish_bytes(
                message.channel.as_str(),
                QoS::AtLeastOnce,
                false,
                Bytes::copy_from_slice(message.payload.as_bytes()),
            )
            .await;
        if let Err(e) = handed_off {
            // Never reached the event loop, so it never takes a packet id
            lock(&self.acks).queued.pop_back();
            return Err(self.publish_error(message, e.to_string()));
        }

        match timeout(self.config.ack_timeout, ack_rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(self.publish_error(message, reason)),
            Ok(Err(_)) => Err(self.publish_error(message, "event loop stopped before PUBACK")),
            Err(_) => Err(self.publish_error(
                message,
                format!("no PUBACK within {:?}", self.config.ack_timeout),
            )),
        }
    }

    /// Every publish already waited for its own PUBACK
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "mqtt_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };

        lock(&self.acks).closing = true;
        if let Err(e) = self.client.disconnect().await {
            warn!(error = %e, "Disconnect request failed");
        }

        let abort = driver.abort_handle();
        if timeout(self.config.drain_timeout, driver).await.is_err() {
            warn!("Event loop did not stop in time, aborting");
            abort.abort();
        }

        info!(broker = %self.config.address, "Disconnected");
        Ok(())
    }
}

impl Drop for MqttSink {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_sink_config() {
        let sink = SinkConfig {
            broker: "ssl://broker.local".to_string(),
            ..SinkConfig::default()
        };
        let config = MqttSinkConfig::from_sink_config(&sink).unwrap();

        assert_eq!(config.address.port, 8883);
        assert!(config.address.tls);
        assert_eq!(
            config.credentials,
            Some(("admin".to_string(), "admin".to_string()))
        );
        assert_eq!(config.keep_alive, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_username_is_anonymous() {
        let sink = SinkConfig {
            username: String::new(),
            ..SinkConfig::default()
        };
        let config = MqttSinkConfig::from_sink_config(&sink).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_bad_broker_url() {
        let sink = SinkConfig {
            broker: "http://localhost".to_string(),
            ..SinkConfig::default()
        };
        assert!(MqttSinkConfig::from_sink_config(&sink).is_err());
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let sink = SinkConfig {
            broker: "tcp://127.0.0.1:1".to_string(),
            connect_timeout_secs: 2,
            ..SinkConfig::default()
        };
        let config = MqttSinkConfig::from_sink_config(&sink).unwrap();

        let err = MqttSink::connect(config).await.err().unwrap();
        assert!(matches!(err, ContractError::SinkConnection { .. }));
    }

    mod broker {
        //! Minimal MQTT 3.1.1 broker speaking just enough to drive the sink

        use std::net::SocketAddr;

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Behaviour {
            /// PUBACK every publish
            Acking,
            /// Accept publishes, never acknowledge
            Silent,
            /// Close the socket on the first publish
            HangUpOnPublish,
        }

        pub async fn start(behaviour: Behaviour) -> SocketAddr {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    while let Some((header, body)) = next_packet(&mut buf) {
                        let reply: &[u8] = match header >> 4 {
                            // CONNECT
                            1 => &[0x20, 0x02, 0x00, 0x00],
                            // PUBLISH
                            3 => match behaviour {
                                Behaviour::HangUpOnPublish => return,
                                Behaviour::Silent => continue,
                                Behaviour::Acking => {
                                    let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                                    let pkid = [body[2 + topic_len], body[3 + topic_len]];
                                    if socket.write_all(&[0x40, 0x02, pkid[0], pkid[1]]).await.is_err() {
                                        return;
                                    }
                                    continue;
                                }
                            },
                            // PINGREQ
                            12 => &[0xD0, 0x00],
                            // DISCONNECT
                            14 => return,
                            _ => continue,
                        };
                        if socket.write_all(reply).await.is_err() {
                            return;
                        }
                    }
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
            });

            addr
        }

        /// Split one complete control packet off the front of `buf`
        fn next_packet(buf: &mut Vec<u8>) -> Option<(u8, Vec<u8>)> {
            let mut remaining = 0usize;
            let mut pos = 1;
            let mut shift = 0;
            loop {
                let byte = *buf.get(pos)?;
                remaining |= usize::from(byte & 0x7F) << shift;
                pos += 1;
                if byte & 0x80 == 0 {
                    break;
                }
                shift += 7;
            }
            if buf.len() < pos + remaining {
                return None;
            }
            let header = buf[0];
            let body = buf[pos..pos + remaining].to_vec();
            buf.drain(..pos + remaining);
            Some((header, body))
        }
    }

    use crate::SinkHandle;
    use broker::Behaviour;
    use contracts::Sentence;
    use std::net::SocketAddr;

    fn local_config(addr: SocketAddr, ack_timeout: Duration) -> MqttSinkConfig {
        let sink = SinkConfig {
            broker: format!("tcp://{addr}"),
            ..SinkConfig::default()
        };
        let mut config = MqttSinkConfig::from_sink_config(&sink).unwrap();
        config.ack_timeout = ack_timeout;
        config.drain_timeout = Duration::from_secs(2);
        config
    }

    fn sentence(i: usize) -> OutboundMessage {
        OutboundMessage::new(
            "producers/mycar/data/track",
            Sentence::from(format!("$GPGGA,07405{i}.00*47").as_str()),
        )
    }

    #[tokio::test]
    async fn test_acknowledged_publishes_count_as_published() {
        let addr = broker::start(Behaviour::Acking).await;
        let sink = MqttSink::connect(local_config(addr, Duration::from_secs(5)))
            .await
            .unwrap();

        let handle = SinkHandle::spawn(sink, 8);
        for i in 0..3 {
            assert!(handle.try_send(sentence(i)));
        }
        let snapshot = handle.shutdown().await;

        assert_eq!(snapshot.published, 3);
        assert_eq!(snapshot.failed, 0);
    }

    #[tokio::test]
    async fn test_missing_puback_is_a_failure() {
        let addr = broker::start(Behaviour::Silent).await;
        let sink = MqttSink::connect(local_config(addr, Duration::from_millis(200)))
            .await
            .unwrap();

        let handle = SinkHandle::spawn(sink, 8);
        for i in 0..3 {
            assert!(handle.try_send(sentence(i)));
        }
        let snapshot = handle.shutdown().await;

        assert_eq!(snapshot.published, 0);
        assert_eq!(snapshot.failed, 3);
    }

    #[tokio::test]
    async fn test_connection_loss_fails_in_flight_publish() {
        let addr = broker::start(Behaviour::HangUpOnPublish).await;
        let mut sink = MqttSink::connect(local_config(addr, Duration::from_secs(30)))
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let err = sink.publish(&sentence(0)).await.unwrap_err();

        assert!(matches!(err, ContractError::SinkPublish { .. }));
        assert!(err.to_string().contains("connection lost"));
        assert!(started.elapsed() < Duration::from_secs(30));
        sink.close().await.unwrap();
    }
}
