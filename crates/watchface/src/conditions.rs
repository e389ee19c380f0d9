//! OpenWeatherMap condition catalog
//!
//! Condition ids: <https://openweathermap.org/weather-conditions>

use contracts::{ConditionCatalog, WeatherIcon};

/// Icon and label lookup for OpenWeatherMap condition ids
#[derive(Debug, Clone, Copy, Default)]
pub struct OwmConditionCatalog;

impl ConditionCatalog for OwmConditionCatalog {
    fn icon_for(&self, condition_code: i32) -> Option<WeatherIcon> {
        let icon = match condition_code {
            200..=232 => WeatherIcon::Storm,
            300..=321 => WeatherIcon::LightRain,
            500..=504 => WeatherIcon::Rain,
            511 => WeatherIcon::Snow,
            520..=531 => WeatherIcon::Rain,
            600..=622 => WeatherIcon::Snow,
            701..=761 => WeatherIcon::Fog,
            781 => WeatherIcon::Storm,
            800 => WeatherIcon::Clear,
            801 => WeatherIcon::LightClouds,
            802..=804 => WeatherIcon::Cloudy,
            _ => return None,
        };
        Some(icon)
    }

    fn label_for(&self, condition_code: i32) -> String {
        match label(condition_code) {
            Some(label) => label.to_string(),
            None => format!("Unknown ({condition_code})"),
        }
    }
}

fn label(code: i32) -> Option<&'static str> {
    let label = match code {
        // Thunderstorm
        200 => "thunderstorm with light rain",
        201 => "thunderstorm with rain",
        202 => "thunderstorm with heavy rain",
        210 => "light thunderstorm",
        211 => "thunderstorm",
        212 => "heavy thunderstorm",
        221 => "ragged thunderstorm",
        230 => "thunderstorm with light drizzle",
        231 => "thunderstorm with drizzle",
        232 => "thunderstorm with heavy drizzle",
        // Drizzle
        300 => "light intensity drizzle",
        301 => "drizzle",
        302 => "heavy intensity drizzle",
        310 => "light intensity drizzle rain",
        311 => "drizzle rain",
        312 => "heavy intensity drizzle rain",
        313 => "shower rain and drizzle",
        314 => "heavy shower rain and drizzle",
        321 => "shower drizzle",
        // Rain
        500 => "light rain",
        501 => "moderate rain",
        502 => "heavy intensity rain",
        503 => "very heavy rain",
        504 => "extreme rain",
        511 => "freezing rain",
        520 => "light intensity shower rain",
        521 => "shower rain",
        522 => "heavy intensity shower rain",
        531 => "ragged shower rain",
        // Snow
        600 => "light snow",
        601 => "snow",
        602 => "heavy snow",
        611 => "sleet",
        612 => "shower sleet",
        615 => "light rain and snow",
        616 => "rain and snow",
        620 => "light shower snow",
        621 => "shower snow",
        622 => "heavy shower snow",
        // Atmosphere
        701 => "mist",
        711 => "smoke",
        721 => "haze",
        731 => "sand, dust whirls",
        741 => "fog",
        751 => "sand",
        761 => "dust",
        762 => "volcanic ash",
        771 => "squalls",
        781 => "tornado",
        // Clear / clouds
        800 => "clear sky",
        801 => "few clouds",
        802 => "scattered clouds",
        803 => "broken clouds",
        804 => "overcast clouds",
        // Extreme
        900 => "tornado",
        901 => "tropical storm",
        902 => "hurricane",
        903 => "cold",
        904 => "hot",
        905 => "windy",
        906 => "hail",
        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icons() {
        let catalog = OwmConditionCatalog;
        assert_eq!(catalog.icon_for(211), Some(WeatherIcon::Storm));
        assert_eq!(catalog.icon_for(301), Some(WeatherIcon::LightRain));
        assert_eq!(catalog.icon_for(501), Some(WeatherIcon::Rain));
        assert_eq!(catalog.icon_for(511), Some(WeatherIcon::Snow));
        assert_eq!(catalog.icon_for(521), Some(WeatherIcon::Rain));
        assert_eq!(catalog.icon_for(601), Some(WeatherIcon::Snow));
        assert_eq!(catalog.icon_for(741), Some(WeatherIcon::Fog));
        assert_eq!(catalog.icon_for(761), Some(WeatherIcon::Fog));
        assert_eq!(catalog.icon_for(781), Some(WeatherIcon::Storm));
        assert_eq!(catalog.icon_for(800), Some(WeatherIcon::Clear));
        assert_eq!(catalog.icon_for(801), Some(WeatherIcon::LightClouds));
        assert_eq!(catalog.icon_for(804), Some(WeatherIcon::Cloudy));
    }

    #[test]
    fn test_unknown_codes() {
        let catalog = OwmConditionCatalog;
        assert_eq!(catalog.icon_for(0), None);
        assert_eq!(catalog.icon_for(905), None);
        assert_eq!(catalog.label_for(42), "Unknown (42)");
    }

    #[test]
    fn test_labels() {
        let catalog = OwmConditionCatalog;
        assert_eq!(catalog.label_for(800), "clear sky");
        assert_eq!(catalog.label_for(500), "light rain");
        assert_eq!(catalog.label_for(804), "overcast clouds");
    }
}
