//! # Sync Engine
//!
//! 主设备（天气数据拥有者）与表盘之间的天气摘要同步。
//!
//! 负责：
//! - [`SyncRequester`]：表盘请求一次新数据并解码响应
//! - [`SyncResponder`]：主设备以 `/weather_data` 应答 `/update_req`
//! - [`PrimaryService`]：包装 responder 的主设备监听循环
//! - 负载编解码与温度格式化
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{PrimaryService, SyncResponder, InMemoryWeatherSource};
//!
//! let hub = data_channel::MemoryHub::default();
//! let phone = hub.node("phone");
//! let responder = SyncResponder::new(phone.clone(), source, "98109", TemperatureUnits::Metric);
//! let service = PrimaryService::spawn(responder, phone.channel());
//! // ...
//! let stats = service.shutdown().await;
//! ```

pub mod codec;
mod format;
mod requester;
mod responder;
mod service;
mod source;

pub use format::format_temperature;
pub use requester::{RequesterStats, SyncRequester};
pub use responder::{SignalOutcome, SyncResponder};
pub use service::{PrimaryHandle, PrimaryService, ResponderStats};
pub use source::InMemoryWeatherSource;
