//! 配置校验模块
//!
//! 字段级规则由配置类型上的 `Validate` derive 负责。
//! 此处校验跨字段规则：
//! - primary 与 companion 节点名不同
//! - 预报 `low <= high`，温度为有限值
//! - 同一地点同一天最多一条预报
//! - 给出预报时，首选地点至少有一条
//! - unreachable 节点必须是已配置的节点

use std::collections::HashSet;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, SunshineConfig};

/// 校验 SunshineConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SunshineConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_node_names(config)?;
    validate_forecast_ranges(config)?;
    validate_forecast_uniqueness(config)?;
    validate_preferred_location(config)?;
    validate_unreachable_nodes(config)?;
    Ok(())
}

/// 执行 derive 字段校验
fn validate_fields(config: &SunshineConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_error("", &errors);
        ContractError::config_validation(field, message)
    })
}

/// 将第一个嵌套校验错误展开为点分字段路径
fn first_error(prefix: &str, errors: &ValidationErrors) -> (String, String) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return (path, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_error(&path, inner),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_error(&format!("{path}[{idx}]"), inner);
                }
            }
        }
    }

    (prefix.to_string(), "invalid value".to_string())
}

/// 校验 primary 与 companion 节点名不同
fn validate_node_names(config: &SunshineConfig) -> Result<(), ContractError> {
    if config.primary.node == config.companion.node {
        return Err(ContractError::config_validation(
            "primary.node / companion.node",
            format!(
                "primary and companion must use different node names, both are '{}'",
                config.primary.node
            ),
        ));
    }
    Ok(())
}

/// 校验预报温度范围
fn validate_forecast_ranges(config: &SunshineConfig) -> Result<(), ContractError> {
    for (idx, forecast) in config.forecasts.iter().enumerate() {
        if !forecast.high.is_finite() || !forecast.low.is_finite() {
            return Err(ContractError::config_validation(
                format!("forecasts[{idx}]"),
                "temperatures must be finite numbers",
            ));
        }
        if forecast.low > forecast.high {
            return Err(ContractError::config_validation(
                format!("forecasts[{idx}].low"),
                format!(
                    "low ({}) must be <= high ({})",
                    forecast.low, forecast.high
                ),
            ));
        }
    }
    Ok(())
}

/// 校验预报 (地点, 日期) 唯一性
fn validate_forecast_uniqueness(config: &SunshineConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, forecast) in config.forecasts.iter().enumerate() {
        if !seen.insert((forecast.location.as_str(), forecast.date)) {
            return Err(ContractError::config_validation(
                format!("forecasts[{idx}]"),
                format!(
                    "duplicate forecast for location '{}' on {}",
                    forecast.location, forecast.date
                ),
            ));
        }
    }
    Ok(())
}

/// 校验首选地点存在预报
fn validate_preferred_location(config: &SunshineConfig) -> Result<(), ContractError> {
    if config.forecasts.is_empty() {
        return Ok(());
    }
    if config.forecasts_for(&config.primary.location).next().is_none() {
        return Err(ContractError::config_validation(
            "primary.location",
            format!(
                "no forecast rows for preferred location '{}'",
                config.primary.location
            ),
        ));
    }
    Ok(())
}

/// 校验 unreachable 节点已配置
fn validate_unreachable_nodes(config: &SunshineConfig) -> Result<(), ContractError> {
    for (idx, node) in config.channel.unreachable_nodes.iter().enumerate() {
        if node != &config.primary.node && node != &config.companion.node {
            return Err(ContractError::config_validation(
                format!("channel.unreachable_nodes[{idx}]"),
                format!("unknown node '{node}'"),
            ));
        }
    }
    Ok(())
}
