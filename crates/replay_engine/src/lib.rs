//! # Replay Engine
//!
//! Walks a [`TimeBucketIndex`](ingestion::TimeBucketIndex) second by second
//! and hands every sentence to a sink.
//!
//! Responsibilities:
//! - Loop over buckets in order, wrapping to the first after the last
//! - Derive the destination channel of each sentence from its `[id]` tag
//! - Pause one pacing unit after each bucket
//! - Observe a cooperative stop signal between buckets and during pauses
//!
//! ## Example
//!
//! ```ignore
//! use replay_engine::{shutdown_channel, ReplayScheduler, SchedulerConfig, TokioPacer};
//!
//! let (trigger, signal) = shutdown_channel();
//! let scheduler = ReplayScheduler::new(&index, SchedulerConfig::from_blueprint(&blueprint));
//! let stats = scheduler.run(&handle, &mut TokioPacer, signal).await;
//! ```

mod pacer;
mod routing;
mod scheduler;
mod shutdown;

pub use pacer::{Pacer, TokioPacer};
pub use routing::{channel_suffix, destination_channel};
pub use scheduler::{ReplayScheduler, ReplayStats, SchedulerConfig};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
