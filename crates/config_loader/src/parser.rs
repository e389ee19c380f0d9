//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, SunshineConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<SunshineConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<SunshineConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<SunshineConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RequestPolicy, TemperatureUnits};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[primary]
location = "98109"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.primary.location, "98109");
        assert_eq!(config.primary.node, "phone");
        assert_eq!(config.primary.units, TemperatureUnits::Metric);
        assert_eq!(config.companion.node, "watch");
        assert!(config.forecasts.is_empty());
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r##"
[primary]
node = "handset"
location = "98109"
units = "imperial"
time_zone_offset_minutes = 60

[companion]
node = "wrist"
request_policy = "once_per_activation"
tick_interval_ms = 500
background = "#000080"
time_zone_offset_minutes = -420

[channel]
connect_latency_ms = 20
unreachable_nodes = ["wrist"]

[[forecasts]]
location = "98109"
date = "2026-10-16"
high = 24.0
low = 14.5
condition = 800
"##;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.primary.units, TemperatureUnits::Imperial);
        assert_eq!(config.primary.time_zone_offset_minutes, 60);
        assert_eq!(
            config.companion.request_policy,
            RequestPolicy::OncePerActivation
        );
        assert_eq!(config.companion.tick_interval_ms, 500);
        assert_eq!(config.companion.time_zone_offset_minutes, -420);
        assert_eq!(config.channel.connect_latency_ms, 20);
        assert_eq!(config.channel.unreachable_nodes, vec!["wrist".to_string()]);
        assert_eq!(config.forecasts.len(), 1);
        assert_eq!(config.forecasts[0].condition, 800);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "primary": { "location": "98109", "units": "imperial" },
            "forecasts": [
                { "location": "98109", "date": "2026-10-16", "high": 24.0, "low": 14.5, "condition": 800 }
            ]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().forecasts.len(), 1);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_units_fails() {
        let content = r#"
[primary]
location = "98109"
units = "kelvin"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
