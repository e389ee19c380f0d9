//! Data channel payloads - paths, keys and the typed sync messages
//!
//! A `DataItem` is what travels over a `DataChannel`; `SyncRequest` and
//! `SyncResponse` are the two typed views carried on it.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SubscriptionHandle, WeatherSnapshot};

/// Path the companion publishes to when it wants fresh data
pub const UPDATE_REQUEST_PATH: &str = "/update_req";

/// Path the primary publishes the weather summary to
pub const WEATHER_DATA_PATH: &str = "/weather_data";

/// Payload keys
pub mod keys {
    /// Request creation time (epoch millis)
    pub const CURRENT_TIME: &str = "curr_time";
    pub const HIGH_TEMP: &str = "high_temp";
    pub const LOW_TEMP: &str = "low_temp";
    pub const WEATHER_CONDITION: &str = "weather_condition";
    /// Observation time (epoch millis), optional
    pub const TIME: &str = "time";
}

/// Single payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DataValue {
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Bytes(Bytes),
}

impl DataValue {
    /// Value type name (used in malformed payload errors)
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::Int(_) => "int",
            DataValue::Long(_) => "long",
            DataValue::Double(_) => "double",
            DataValue::Bool(_) => "bool",
            DataValue::Bytes(_) => "bytes",
        }
    }
}

/// Ordered key/value payload map
pub type DataMap = BTreeMap<String, DataValue>;

/// Item stored at a path on the data channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub path: String,
    pub map: DataMap,
}

impl DataItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            map: DataMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: DataValue) -> Self {
        self.map.insert(key.into(), value);
        self
    }
}

/// Change notification delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct DataEvent {
    /// Subscription that delivered this event
    pub subscription: SubscriptionHandle,
    pub path: String,
    pub map: DataMap,
}

impl DataEvent {
    pub fn is_path(&self, path: &str) -> bool {
        self.path == path
    }
}

/// Companion -> primary: "please send fresh data"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub created_at: DateTime<Utc>,
}

impl SyncRequest {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self { created_at }
    }
}

/// Primary -> companion: the weather summary
///
/// No sequence number; the last write on the path wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub snapshot: WeatherSnapshot,
}

impl From<WeatherSnapshot> for SyncResponse {
    fn from(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_item_builder_keeps_keys_ordered() {
        let item = DataItem::new(WEATHER_DATA_PATH)
            .with(keys::WEATHER_CONDITION, DataValue::Int(800))
            .with(keys::HIGH_TEMP, DataValue::String("75°".into()));

        let keys: Vec<_> = item.map.keys().cloned().collect();
        assert_eq!(keys, vec!["high_temp", "weather_condition"]);
        assert_eq!(item.path, "/weather_data");
    }

    #[test]
    fn data_value_type_names() {
        assert_eq!(DataValue::Long(1).type_name(), "long");
        assert_eq!(DataValue::Bytes(Bytes::from_static(b"x")).type_name(), "bytes");
    }
}
