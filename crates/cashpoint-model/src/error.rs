//! Error types for the model crate.

use std::path::PathBuf;

use cashpoint_core::CoreError;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors surfaced by the model crate.
///
/// Filter dispatch never produces one of these: bad filter options are
/// logged and replaced with empty options.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A server request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Event loop or signal failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Errors raised while loading [`ListModelConfig`](crate::config::ListModelConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or type error.
    #[error("invalid list model config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors reported by a [`ServerApi`](crate::api::ServerApi) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be delivered.
    #[error("request to '{endpoint}' failed: {message}")]
    Request { endpoint: String, message: String },

    /// The server answered with an error status.
    #[error("server returned status {status} for '{endpoint}'")]
    Status { endpoint: String, status: u16 },

    /// The response body could not be decoded.
    #[error("failed to decode response from '{endpoint}': {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Endpoint the failed request was addressed to.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Request { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }

    /// Returns `true` for failures worth retrying: delivery errors and
    /// 5xx statuses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => (500..600).contains(status),
            Self::Decode { .. } => false,
        }
    }
}
