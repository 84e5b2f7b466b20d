//! 回放指标
//!
//! 基于 `metrics` facade 的薄封装。未安装 recorder 时所有调用均为空操作。

use metrics::{counter, gauge, histogram};

/// 记录桶索引构建结果
pub fn record_index_built(
    candidates: u64,
    without_timestamp: u64,
    out_of_range: u64,
    buckets: usize,
    non_empty: usize,
) {
    counter!("nmea_replay_sentences_extracted_total").increment(candidates);
    counter!("nmea_replay_sentences_dropped_total", "reason" => "no_timestamp")
        .increment(without_timestamp);
    counter!("nmea_replay_sentences_dropped_total", "reason" => "out_of_range")
        .increment(out_of_range);
    counter!("nmea_replay_sentences_indexed_total")
        .increment(candidates.saturating_sub(without_timestamp + out_of_range));
    gauge!("nmea_replay_index_buckets").set(buckets as f64);
    gauge!("nmea_replay_index_non_empty_buckets").set(non_empty as f64);
}

/// 记录一个已交给 sink 的时间桶
pub fn record_bucket_replayed(offset: usize, messages: usize) {
    counter!("nmea_replay_buckets_total").increment(1);
    gauge!("nmea_replay_bucket_offset").set(offset as f64);
    histogram!("nmea_replay_bucket_messages").record(messages as f64);
}

/// 记录完成一轮完整区间回放
pub fn record_pass_completed(pass: u64) {
    counter!("nmea_replay_passes_total").increment(1);
    gauge!("nmea_replay_current_pass").set(pass as f64);
}

/// 记录一次发布结果
pub fn record_message_delivery(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "nmea_replay_messages_published_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录因队列已满或已关闭而丢弃的消息
pub fn record_message_dropped(sink_name: &str) {
    counter!(
        "nmea_replay_messages_dropped_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// [`RunningStats`] 的统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线均值/方差 (Welford 算法)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for value in iter {
            stats.push(value);
        }
        stats
    }
}
