//! Temperature formatting

use contracts::TemperatureUnits;

/// Format a stored (°C) temperature for display, e.g. `"75°"`
///
/// Rounds half away from zero; imperial converts to °F first.
pub fn format_temperature(celsius: f64, units: TemperatureUnits) -> String {
    let value = match units {
        TemperatureUnits::Metric => celsius,
        TemperatureUnits::Imperial => celsius * 9.0 / 5.0 + 32.0,
    };
    let rounded = value.round();
    // Avoid "-0°"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}°")
}
