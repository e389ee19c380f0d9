//! Payload codec
//!
//! Maps `SyncRequest` / `SyncResponse` to and from channel `DataMap`s.

use chrono::{DateTime, TimeZone, Utc};
use contracts::{
    keys, ContractError, DataItem, DataMap, DataValue, SyncRequest, SyncResponse,
    WeatherSnapshot, UPDATE_REQUEST_PATH, WEATHER_DATA_PATH,
};

pub fn encode_request(request: &SyncRequest) -> DataItem {
    DataItem::new(UPDATE_REQUEST_PATH).with(
        keys::CURRENT_TIME,
        DataValue::Long(request.created_at.timestamp_millis()),
    )
}

pub fn decode_request(map: &DataMap) -> Result<SyncRequest, ContractError> {
    let millis = long_field(UPDATE_REQUEST_PATH, map, keys::CURRENT_TIME)?;
    let created_at = millis_to_utc(UPDATE_REQUEST_PATH, keys::CURRENT_TIME, millis)?;
    Ok(SyncRequest::new(created_at))
}

pub fn encode_response(response: &SyncResponse) -> DataItem {
    let snapshot = &response.snapshot;
    DataItem::new(WEATHER_DATA_PATH)
        .with(
            keys::HIGH_TEMP,
            DataValue::String(snapshot.high_temp().to_string()),
        )
        .with(
            keys::LOW_TEMP,
            DataValue::String(snapshot.low_temp().to_string()),
        )
        .with(
            keys::WEATHER_CONDITION,
            DataValue::Int(snapshot.condition_code()),
        )
        .with(
            keys::TIME,
            DataValue::Long(snapshot.observed_at().timestamp_millis()),
        )
}

/// Decode a weather payload
///
/// All three summary fields are required; `time` is optional and falls back
/// to `received_at`.
pub fn decode_response(
    map: &DataMap,
    received_at: DateTime<Utc>,
) -> Result<SyncResponse, ContractError> {
    let high = string_field(WEATHER_DATA_PATH, map, keys::HIGH_TEMP)?;
    let low = string_field(WEATHER_DATA_PATH, map, keys::LOW_TEMP)?;
    let condition = int_field(WEATHER_DATA_PATH, map, keys::WEATHER_CONDITION)?;

    let observed_at = match map.get(keys::TIME) {
        None => received_at,
        Some(_) => {
            let millis = long_field(WEATHER_DATA_PATH, map, keys::TIME)?;
            millis_to_utc(WEATHER_DATA_PATH, keys::TIME, millis)?
        }
    };

    Ok(SyncResponse::from(WeatherSnapshot::new(
        high,
        low,
        condition,
        observed_at,
    )))
}

fn field<'a>(path: &str, map: &'a DataMap, key: &str) -> Result<&'a DataValue, ContractError> {
    map.get(key)
        .ok_or_else(|| ContractError::malformed(path, key, "is missing"))
}

fn wrong_type(path: &str, key: &str, expected: &str, found: &DataValue) -> ContractError {
    ContractError::malformed(
        path,
        key,
        format!("has type {}, expected {expected}", found.type_name()),
    )
}

fn string_field(path: &str, map: &DataMap, key: &str) -> Result<String, ContractError> {
    match field(path, map, key)? {
        DataValue::String(s) => Ok(s.clone()),
        other => Err(wrong_type(path, key, "string", other)),
    }
}

fn int_field(path: &str, map: &DataMap, key: &str) -> Result<i32, ContractError> {
    match field(path, map, key)? {
        DataValue::Int(v) => Ok(*v),
        other => Err(wrong_type(path, key, "int", other)),
    }
}

fn long_field(path: &str, map: &DataMap, key: &str) -> Result<i64, ContractError> {
    match field(path, map, key)? {
        DataValue::Long(v) => Ok(*v),
        DataValue::Int(v) => Ok(i64::from(*v)),
        other => Err(wrong_type(path, key, "long", other)),
    }
}

fn millis_to_utc(path: &str, key: &str, millis: i64) -> Result<DateTime<Utc>, ContractError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ContractError::malformed(path, key, format!("timestamp {millis} out of range")))
}
