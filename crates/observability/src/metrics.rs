//! 同步协议指标
//!
//! 面向 Prometheus 的两端指标记录函数，以及用于运行结束汇总的内存聚合器。

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// 设备端标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Primary,
    Companion,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Primary => "primary",
            Side::Companion => "companion",
        }
    }
}

/// 表盘发布了同步请求
pub fn record_request_published(delivered: bool) {
    let status = if delivered { "delivered" } else { "ignored" };
    counter!("sunshine_requests_published_total", "status" => status).increment(1);
}

/// 主设备发布了天气响应
pub fn record_response_published(condition_code: i32) {
    counter!("sunshine_responses_published_total").increment(1);
    gauge!("sunshine_last_condition_code").set(condition_code as f64);
}

/// 表盘接收了天气快照
///
/// `latency_ms` 为请求 -> 响应延迟（已知时）。
pub fn record_response_received(latency_ms: Option<f64>) {
    counter!("sunshine_snapshots_received_total").increment(1);
    if let Some(latency) = latency_ms {
        histogram!("sunshine_sync_latency_ms").record(latency);
    }
}

/// 表盘丢弃了无法解码的负载
pub fn record_payload_dropped(reason: &str) {
    counter!("sunshine_payloads_dropped_total", "reason" => reason.to_string()).increment(1);
}

/// 主设备没有可发布的预报
pub fn record_no_data(location: &str) {
    counter!("sunshine_no_data_total", "location" => location.to_string()).increment(1);
}

/// 连接尝试失败
pub fn record_connection_failure(side: Side) {
    counter!("sunshine_connection_failures_total", "side" => side.as_str()).increment(1);
}

/// 主设备收到未处理路径上的变更
///
/// `kind` 只能取固定集合中的值，原始路径只写入日志。
pub fn record_signal_ignored(kind: &'static str) {
    counter!("sunshine_signals_ignored_total", "kind" => kind).increment(1);
}

/// 表盘绘制了一帧
pub fn record_redraw(ambient: bool) {
    let mode = if ambient { "ambient" } else { "interactive" };
    counter!("sunshine_redraws_total", "mode" => mode).increment(1);
}

/// 同步指标聚合器
///
/// 在内存中聚合，用于运行结束时打印汇总。
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// 表盘发布的请求数
    pub requests_published: u64,

    /// 主设备发布的响应数
    pub responses_published: u64,

    /// 表盘接收的快照数
    pub snapshots_received: u64,

    /// 无数据的请求数
    pub no_data: u64,

    /// 连接失败次数（两端合计）
    pub connection_failures: u64,

    /// 绘制帧数
    pub redraws: u64,

    /// 请求 -> 响应延迟 (ms)
    pub latency_stats: RunningStats,

    /// 按原因统计的丢弃负载
    pub dropped: BTreeMap<String, u64>,
}

impl SyncMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&mut self) {
        self.requests_published += 1;
    }

    pub fn record_response(&mut self) {
        self.responses_published += 1;
    }

    pub fn record_snapshot(&mut self, latency_ms: Option<f64>) {
        self.snapshots_received += 1;
        if let Some(latency) = latency_ms {
            self.latency_stats.push(latency);
        }
    }

    pub fn record_dropped(&mut self, reason: &str) {
        *self.dropped.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn record_no_data(&mut self) {
        self.no_data += 1;
    }

    pub fn record_connection_failure(&mut self) {
        self.connection_failures += 1;
    }

    pub fn record_redraw(&mut self) {
        self.redraws += 1;
    }

    /// 生成汇总报告
    pub fn summary(&self) -> MetricsSummary {
        let total_dropped: u64 = self.dropped.values().sum();
        let received = self.snapshots_received + total_dropped;
        MetricsSummary {
            requests_published: self.requests_published,
            responses_published: self.responses_published,
            snapshots_received: self.snapshots_received,
            no_data: self.no_data,
            connection_failures: self.connection_failures,
            redraws: self.redraws,
            total_dropped,
            drop_rate: if received > 0 {
                total_dropped as f64 / received as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            dropped_by_reason: self.dropped.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标汇总
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub requests_published: u64,
    pub responses_published: u64,
    pub snapshots_received: u64,
    pub no_data: u64,
    pub connection_failures: u64,
    pub redraws: u64,
    pub total_dropped: u64,
    pub drop_rate: f64,
    pub latency_ms: StatsSummary,
    pub dropped_by_reason: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sync Metrics Summary ===")?;
        writeln!(f, "Requests published: {}", self.requests_published)?;
        writeln!(f, "Responses published: {}", self.responses_published)?;
        writeln!(f, "Snapshots received: {}", self.snapshots_received)?;
        writeln!(
            f,
            "Dropped payloads: {} ({:.2}%)",
            self.total_dropped, self.drop_rate
        )?;
        writeln!(f, "No-data signals: {}", self.no_data)?;
        writeln!(f, "Connection failures: {}", self.connection_failures)?;
        writeln!(f, "Redraws: {}", self.redraws)?;
        writeln!(f, "Sync latency (ms): {}", self.latency_ms)?;

        if !self.dropped_by_reason.is_empty() {
            writeln!(f, "Dropped by reason:")?;
            for (reason, count) in &self.dropped_by_reason {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
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
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
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
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
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
}
