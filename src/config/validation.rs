//! Configuration validation logic
//!
//! Rejects values that would otherwise be silently skipped at request time,
//! such as CORS entries that cannot be sent as header values.

use axum::http::{HeaderName, HeaderValue, Method};

use crate::config::error::ConfigError;
use crate::config::settings::{LoggerSettings, ServerConfig, Settings, TenantSettings};
use crate::middleware::CorsConfig;

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Host must not be empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("server.host", "Host must not be empty."));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl CorsConfig {
    /// # Validation Rules
    /// - Origins must be non-empty and usable as header values
    /// - Methods must be valid HTTP method tokens
    /// - Headers must be valid header names
    pub fn validate(&self) -> Result<(), ConfigError> {
        for origin in &self.allowed_origins {
            if origin.is_empty() || HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::validation(
                    "cors.allowed_origins",
                    format!("'{}' is not a valid origin", origin),
                ));
            }
        }

        for method in &self.allowed_methods {
            if Method::from_bytes(method.as_bytes()).is_err() {
                return Err(ConfigError::validation(
                    "cors.allowed_methods",
                    format!("'{}' is not a valid HTTP method", method),
                ));
            }
        }

        for header in &self.allowed_headers {
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(ConfigError::validation(
                    "cors.allowed_headers",
                    format!("'{}' is not a valid header name", header),
                ));
            }
        }

        Ok(())
    }
}

impl TenantSettings {
    /// # Validation Rules
    /// - Parameter name must not be empty when the resolver reads path params
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver && self.path_params && self.url_param_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "tenant.url_param_name",
                "URL parameter name must not be empty.",
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.cors.validate()?;
        self.tenant.validate()?;
        Ok(())
    }
}
