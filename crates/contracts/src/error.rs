//! Layered error definitions
//!
//! Categorized by source: config / channel / source / payload

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Channel Errors =====
    /// Data channel could not be reached
    #[error("channel connection error for node '{node}': {message}")]
    ChannelConnection { node: String, message: String },

    /// Operation requires a connected channel
    #[error("channel for node '{node}' is not connected")]
    ChannelNotConnected { node: String },

    // ===== Weather Source Errors =====
    /// Local weather source query failed
    #[error("weather source error for location '{location}': {message}")]
    WeatherSource { location: String, message: String },

    // ===== Payload Errors =====
    /// Payload missing a field or carrying the wrong type
    #[error("malformed payload on '{path}': field '{field}' {message}")]
    MalformedPayload {
        path: String,
        field: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create channel connection error
    pub fn channel_connection(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelConnection {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create weather source error
    pub fn weather_source(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WeatherSource {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create malformed payload error
    pub fn malformed(
        path: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPayload {
            path: path.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}
