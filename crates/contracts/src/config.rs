//! SunshineConfig - Config Loader 输出
//!
//! 描述一次会话的两端：主设备（天气数据拥有者）、表盘、数据通道以及预置的预报数据。

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::Forecast;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整会话配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SunshineConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 主设备（天气数据拥有者）
    #[validate(nested)]
    pub primary: PrimaryConfig,

    /// 表盘设备
    #[serde(default)]
    #[validate(nested)]
    pub companion: CompanionConfig,

    /// 数据通道行为
    #[serde(default)]
    #[validate(nested)]
    pub channel: ChannelConfig,

    /// 预置到主设备天气数据源的预报
    #[serde(default)]
    #[validate(nested)]
    pub forecasts: Vec<ForecastConfig>,
}

/// 主设备配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PrimaryConfig {
    /// 数据通道上的节点名
    #[serde(default = "default_primary_node")]
    #[validate(length(min = 1, message = "node name must not be empty"))]
    pub node: String,

    /// 首选地点（如邮编）
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: String,

    /// 温度格式化单位
    #[serde(default)]
    pub units: TemperatureUnits,

    /// 相对 UTC 的本地时区偏移（分钟），决定预报起始日
    #[serde(default)]
    #[validate(range(min = -720, max = 840, message = "must be within -720..=840 minutes"))]
    pub time_zone_offset_minutes: i32,
}

impl PrimaryConfig {
    /// 主设备本地时区偏移
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.time_zone_offset_minutes * 60)
    }
}

fn default_primary_node() -> String {
    "phone".to_string()
}

/// 温度显示单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnits {
    /// 摄氏度（存储单位）
    #[default]
    Metric,
    /// 华氏度
    Imperial,
}

/// 表盘配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanionConfig {
    /// 数据通道上的节点名
    #[serde(default = "default_companion_node")]
    #[validate(length(min = 1, message = "node name must not be empty"))]
    pub node: String,

    /// "已请求" 标志的生命周期
    #[serde(default)]
    pub request_policy: RequestPolicy,

    /// 交互模式重绘间隔 (ms)
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 1, max = 60000, message = "must be within 1..=60000 ms"))]
    pub tick_interval_ms: u64,

    /// 交互模式背景色 (`#RRGGBB`)
    #[serde(default = "default_background")]
    #[validate(custom(function = "validate_hex_color"))]
    pub background: String,

    /// 相对 UTC 的本地时区偏移（分钟）
    #[serde(default)]
    #[validate(range(min = -720, max = 840, message = "must be within -720..=840 minutes"))]
    pub time_zone_offset_minutes: i32,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            node: default_companion_node(),
            request_policy: RequestPolicy::default(),
            tick_interval_ms: default_tick_interval_ms(),
            background: default_background(),
            time_zone_offset_minutes: 0,
        }
    }
}

fn default_companion_node() -> String {
    "watch".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_background() -> String {
    "#0288D1".to_string()
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if parse_hex_color(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("expected a colour like #0288D1".into());
        Err(err)
    }
}

/// 解析 `#RRGGBB` 颜色
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// 表盘 "已请求" 标志的生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPolicy {
    /// 仅在创建新 requester 时重置
    #[default]
    OncePerInstance,
    /// 每次 deactivate 时重置
    OncePerActivation,
}

/// 内存通道行为（延迟与故障注入）
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ChannelConfig {
    /// 连接完成前的延迟 (ms)
    #[serde(default)]
    #[validate(range(max = 60000))]
    pub connect_latency_ms: u64,

    /// 变更通知投递延迟 (ms)
    #[serde(default)]
    #[validate(range(max = 60000))]
    pub delivery_latency_ms: u64,

    /// 非紧急发布的额外批处理延迟 (ms)
    #[serde(default)]
    #[validate(range(max = 600000))]
    pub batch_delay_ms: u64,

    /// 连接必定失败的节点
    #[serde(default)]
    pub unreachable_nodes: Vec<String>,
}

/// 预置预报
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForecastConfig {
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: String,

    /// 预报日期 (`YYYY-MM-DD`)
    pub date: NaiveDate,

    /// 日最高温 (°C)
    pub high: f64,

    /// 日最低温 (°C)
    pub low: f64,

    /// OpenWeatherMap 天气代码
    #[validate(range(min = 200, max = 999, message = "not a known condition id"))]
    pub condition: i32,
}

impl ForecastConfig {
    pub fn to_forecast(&self) -> Forecast {
        Forecast {
            date: self.date,
            high: self.high,
            low: self.low,
            condition_code: self.condition,
        }
    }
}

impl SunshineConfig {
    /// 指定地点的预报（按文件顺序）
    pub fn forecasts_for<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a ForecastConfig> {
        self.forecasts.iter().filter(move |f| f.location == location)
    }

    /// 通道是否拒绝 `node` 的连接
    pub fn is_unreachable(&self, node: &str) -> bool {
        self.channel.unreachable_nodes.iter().any(|n| n == node)
    }
}
