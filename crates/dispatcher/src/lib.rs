//! # Dispatcher
//!
//! 消息投递模块。
//!
//! 职责：
//! - 连接配置的 sink (MQTT broker 或日志)
//! - 通过有界队列和 worker 任务将发布与回放循环解耦
//! - 记录并统计每次发布结果，不重试

pub mod error;
pub mod factory;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{MessageSink, OutboundMessage};
pub use error::DispatcherError;
pub use factory::connect_sink;
pub use handle::SinkHandle;
pub use metrics::{DeliveryMetrics, DeliverySnapshot};
pub use sinks::{LogSink, MemorySink, MqttSink, MqttSinkConfig};
