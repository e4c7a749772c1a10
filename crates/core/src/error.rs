//! Configuration error model.

use thiserror::Error;

/// Result type used while loading configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Startup configuration failure.
///
/// These are only raised once, at process start; nothing in the request path
/// returns a `ConfigError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// A variable was present but empty where a value is mandatory.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
