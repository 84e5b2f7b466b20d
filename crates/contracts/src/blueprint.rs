//! ReplayBlueprint - Config Loader 输出
//!
//! 描述完整的回放：源日志、时间区间、sink 端点、节拍。
//! 所有字段均有默认值，空文件（或没有文件）也是合法配置。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::{ContractError, Interval};

pub const DEFAULT_SOURCE_PATH: &str = "./mosaic.txt";
pub const DEFAULT_INTERVAL_START: &str = "2023-09-21 07:40:56";
pub const DEFAULT_INTERVAL_END: &str = "2023-09-21 07:59:00";
pub const DEFAULT_BROKER: &str = "tcp://localhost:1883";
pub const DEFAULT_TOPIC_PREFIX: &str = "producers/mycar/data";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
/// 语句不带 `[id]` 标签时使用的通道后缀
pub const DEFAULT_CHANNEL: &str = "track";

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整回放配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReplayBlueprint {
    /// 配置版本
    pub version: ConfigVersion,

    /// 语句来源
    #[validate(nested)]
    pub source: SourceConfig,

    /// 语句去向
    #[validate(nested)]
    pub sink: SinkConfig,

    /// 节拍与路由
    #[validate(nested)]
    pub replay: ReplaySettings,
}

/// 源日志及其回放区间
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SourceConfig {
    /// 录制的语句日志 (UTF-8 文本)
    pub path: PathBuf,

    #[validate(nested)]
    pub interval: IntervalConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SOURCE_PATH),
            interval: IntervalConfig::default(),
        }
    }
}

/// 配置中书写的区间边界，`YYYY-MM-DD HH:MM:SS`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IntervalConfig {
    #[validate(length(min = 1))]
    pub start: String,

    #[validate(length(min = 1))]
    pub end: String,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_INTERVAL_START.to_string(),
            end: DEFAULT_INTERVAL_END.to_string(),
        }
    }
}

impl IntervalConfig {
    /// 解析为经过校验的 [`Interval`]
    pub fn to_interval(&self) -> Result<Interval, ContractError> {
        Interval::parse(&self.start, &self.end)
    }
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// MQTT broker (QoS 1)
    #[default]
    Mqtt,
    /// 仅输出到 Tracing 日志，不连接 broker
    Log,
}

/// Sink 端点配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink 类型
    pub kind: SinkKind,

    /// Broker 地址，`scheme://host[:port]`
    #[validate(length(min = 1))]
    pub broker: String,

    /// 用户名为空时不进行认证
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// 目标通道前缀；后缀按消息推导
    #[validate(length(min = 1))]
    pub topic_prefix: String,

    #[validate(length(min = 1))]
    pub client_id: String,

    #[validate(range(min = 5))]
    pub keep_alive_secs: u64,

    #[validate(range(min = 1))]
    pub connect_timeout_secs: u64,

    /// 调度器与 sink worker 之间的队列容量
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// QoS 1 发布等待 PUBACK 的最长时间
    #[validate(range(min = 1))]
    pub ack_timeout_secs: u64,

    /// 关闭时等待 broker 会话结束的最长时间
    pub drain_timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Mqtt,
            broker: DEFAULT_BROKER.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            client_id: "nmea-replay".to_string(),
            keep_alive_secs: 5,
            connect_timeout_secs: 10,
            queue_capacity: 4096,
            ack_timeout_secs: 5,
            drain_timeout_secs: 5,
        }
    }
}

impl SinkConfig {
    pub fn uses_auth(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// 回放节拍与路由
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReplaySettings {
    /// 相邻时间桶之间的实际等待时间
    #[validate(range(min = 1))]
    pub pacing_ms: u64,

    /// 不带 `[id]` 标签的语句使用的通道后缀
    #[validate(length(min = 1))]
    pub default_channel: String,

    /// 完成指定轮数后停止（缺省 = 运行直到取消）
    #[validate(range(min = 1))]
    pub max_passes: Option<u64>,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            pacing_ms: 1000,
            default_channel: DEFAULT_CHANNEL.to_string(),
            max_passes: None,
        }
    }
}

impl ReplaySettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
