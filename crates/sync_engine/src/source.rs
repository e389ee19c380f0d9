//! In-memory weather source
//!
//! Stands in for the primary's local weather store. Rows are kept per
//! location in ascending date order.

use std::collections::HashMap;

use chrono::NaiveDate;
use contracts::{ContractError, Forecast, SunshineConfig, WeatherSource};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryWeatherSource {
    rows: RwLock<HashMap<String, Vec<Forecast>>>,
}

impl InMemoryWeatherSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the `forecasts` section of a config
    pub fn from_config(config: &SunshineConfig) -> Self {
        let source = Self::new();
        for row in &config.forecasts {
            source.insert(&row.location, row.to_forecast());
        }
        source
    }

    /// Insert or replace the row for (location, date)
    pub fn insert(&self, location: &str, forecast: Forecast) {
        let mut rows = self.rows.write();
        let list = rows.entry(location.to_string()).or_default();
        match list.binary_search_by_key(&forecast.date, |f| f.date) {
            Ok(idx) => list[idx] = forecast,
            Err(idx) => list.insert(idx, forecast),
        }
    }

    /// Remove all rows for a location
    pub fn clear(&self, location: &str) {
        self.rows.write().remove(location);
    }

    pub fn len(&self) -> usize {
        self.rows.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WeatherSource for InMemoryWeatherSource {
    fn latest_forecast(
        &self,
        location: &str,
        not_before: NaiveDate,
    ) -> Result<Option<Forecast>, ContractError> {
        Ok(self
            .rows
            .read()
            .get(location)
            .and_then(|list| list.iter().find(|f| f.date >= not_before).copied()))
    }
}
