//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating [`Settings`](super::Settings)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// `field` is the dotted path of the offending key
    #[error("Invalid configuration value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Environment variable error: {0}")]
    EnvVar(String),

    #[error("Conflicting configuration sources: {0}")]
    MutualExclusivity(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn env_var(message: impl Into<String>) -> Self {
        ConfigError::EnvVar(message.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivity(message.into())
    }

    /// Dotted key path for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}
