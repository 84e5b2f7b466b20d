//! Wall-clock pacing between buckets

use std::time::Duration;

/// Suspends the scheduler between buckets.
#[trait_variant::make(Pacer: Send)]
pub trait LocalPacer {
    async fn pause(&mut self, duration: Duration);
}

/// Real-time pacing with `tokio::time::sleep`.
///
/// Each pause is relative to when it starts, so drift accumulates over long
/// runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
