//! WeatherSnapshot - SyncResponder output, RenderStateMachine input
//!
//! Immutable point-in-time weather summary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Weather summary shown on the companion
///
/// Fields are private: a snapshot is built once and only ever replaced
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    high_temp: String,
    low_temp: String,
    condition_code: i32,
    observed_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn new(
        high_temp: impl Into<String>,
        low_temp: impl Into<String>,
        condition_code: i32,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            high_temp: high_temp.into(),
            low_temp: low_temp.into(),
            condition_code,
            observed_at,
        }
    }

    /// Formatted high temperature (e.g. "75°")
    pub fn high_temp(&self) -> &str {
        &self.high_temp
    }

    /// Formatted low temperature
    pub fn low_temp(&self) -> &str {
        &self.low_temp
    }

    /// Raw condition code (OpenWeatherMap id)
    pub fn condition_code(&self) -> i32 {
        self.condition_code
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// Forecast row as stored by the local weather source
///
/// Temperatures are in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Forecast day
    pub date: NaiveDate,
    /// Daily maximum (°C)
    pub high: f64,
    /// Daily minimum (°C)
    pub low: f64,
    /// OpenWeatherMap condition id
    pub condition_code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_accessors() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let snapshot = WeatherSnapshot::new("75°", "58°", 800, at);
        assert_eq!(snapshot.high_temp(), "75°");
        assert_eq!(snapshot.low_temp(), "58°");
        assert_eq!(snapshot.condition_code(), 800);
        assert_eq!(snapshot.observed_at(), at);
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let snapshot = WeatherSnapshot::new("21°", "12°", 501, at);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: WeatherSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }
}
