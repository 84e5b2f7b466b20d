//! Sink implementations
//!
//! Contains MqttSink, LogSink, and MemorySink.

mod log;
mod memory;
mod mqtt;

pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::mqtt::{MqttSink, MqttSinkConfig};
