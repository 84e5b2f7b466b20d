//! SinkHandle - owns a sink behind an isolated queue and worker task
//!
//! The replay loop only ever calls [`SinkHandle::try_send`], which never waits
//! for the sink. The worker publishes in queue order and reports each outcome.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{MessageSink, OutboundMessage};
use observability::{record_message_delivery, record_message_dropped};

use crate::metrics::{DeliveryMetrics, DeliverySnapshot};

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send messages to worker
    tx: mpsc::Sender<OutboundMessage>,
    /// Shared metrics
    metrics: Arc<DeliveryMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: MessageSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(DeliveryMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    /// Queue a message for publishing (non-blocking)
    ///
    /// Returns true if queued, false if the queue was full or the worker is
    /// gone (message dropped).
    pub fn try_send(&self, message: OutboundMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(m)) => {
                self.metrics.record_dropped();
                record_message_dropped(&self.name);
                warn!(
                    sink = %self.name,
                    channel = %m.channel,
                    payload = %m.payload,
                    "Queue full, message dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_dropped();
                record_message_dropped(&self.name);
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Stop accepting messages, drain the queue, flush and close the sink.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> DeliverySnapshot {
        // Dropping the sender lets the worker finish the queue and exit
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        let snapshot = self.metrics.snapshot();
        debug!(sink = %self.name, ?snapshot, "SinkHandle shutdown complete");
        snapshot
    }
}

/// Worker task that consumes messages and publishes them to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: MessageSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<OutboundMessage>,
    metrics: Arc<DeliveryMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(message) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.publish(&message).await {
            Ok(()) => {
                metrics.record_published();
                record_message_delivery(&name, true);
                info!(
                    sink = %name,
                    channel = %message.channel,
                    payload = %message.payload,
                    "Published"
                );
            }
            Err(e) => {
                metrics.record_failed();
                record_message_delivery(&name, false);
                error!(
                    sink = %name,
                    channel = %message.channel,
                    payload = %message.payload,
                    error = %e,
                    "Publish failed"
                );
                // No retry: the next pass of the replay will carry the sentence again
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
