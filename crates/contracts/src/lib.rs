//! # Contracts
//!
//! Shared data structures and traits for the replay pipeline.
//! Every other crate in the workspace depends on this one; it depends on none of them.
//!
//! ## Time Model
//! - Sentences carry only a time of day (`HHMMSS[.fff]`)
//! - The calendar date always comes from the configured interval start
//! - Buckets are one second wide and indexed by offset from the interval start

mod blueprint;
mod broker;
mod error;
mod interval;
mod message;
mod sentence;
mod sink;

pub use blueprint::*;
pub use broker::{BrokerAddress, MQTT_PLAIN_PORT, MQTT_TLS_PORT};
pub use error::*;
pub use interval::{Interval, INTERVAL_FORMAT};
pub use message::OutboundMessage;
pub use sentence::Sentence;
pub use sink::*;
