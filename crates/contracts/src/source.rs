//! WeatherSource / ConditionCatalog - primary-side store and companion-side lookup

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ContractError, Forecast};

/// Local weather store on the primary
pub trait WeatherSource: Send + Sync {
    /// Earliest forecast for `location` dated on or after `not_before`
    ///
    /// Rows are considered in ascending date order; the first match wins.
    fn latest_forecast(
        &self,
        location: &str,
        not_before: NaiveDate,
    ) -> Result<Option<Forecast>, ContractError>;
}

/// Condition icon shown in the interactive weather panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Cloudy,
}

/// Maps condition codes to icons and human-readable labels
pub trait ConditionCatalog: Send + Sync {
    fn icon_for(&self, condition_code: i32) -> Option<WeatherIcon>;

    fn label_for(&self, condition_code: i32) -> String;
}
