//! Configuration settings structures
//!
//! All structures can be loaded from TOML files and environment variables;
//! every field has a serde default so partial files are accepted.

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{LogFormat, LoggerConfig};
use crate::middleware::{CorsConfig, DEFAULT_URL_PARAM_NAME, RoutePathParams, TenantConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "httpware".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "full".to_string()
}

fn default_true() -> bool {
    true
}

fn default_url_param_name() -> String {
    DEFAULT_URL_PARAM_NAME.to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP listener configuration for the demo server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Logger settings as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to use colored output on terminals
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            colored: default_true(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.format", e.to_string()))?;

        LoggerConfig::new(self.level, format, self.colored)
            .map_err(|e| ConfigError::validation("logger.level", e.to_string()))
    }
}

// ============================================================================
// Tenant Settings
// ============================================================================

/// File-configurable part of the tenant resolver.
///
/// Claims extraction depends on the host's auth layer and can only be
/// attached in code, see [`TenantConfig::with_claims_extractor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Use the chained resolver instead of the header-only stage
    #[serde(default)]
    pub resolver: bool,

    /// Name of the path parameter carrying the tenant
    #[serde(default = "default_url_param_name")]
    pub url_param_name: String,

    /// Consult router path parameters
    #[serde(default = "default_true")]
    pub path_params: bool,

    /// Reject requests without tenant context with 400
    #[serde(default)]
    pub required: bool,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            resolver: false,
            url_param_name: default_url_param_name(),
            path_params: default_true(),
            required: false,
        }
    }
}

impl TenantSettings {
    /// Builds the resolver configuration, or `None` for the header-only stage.
    pub fn to_tenant_config(&self) -> Option<TenantConfig> {
        if !self.resolver {
            return None;
        }

        let config = TenantConfig::new()
            .with_url_param_name(self.url_param_name.clone())
            .required(self.required);

        Some(if self.path_params {
            config.with_url_param(RoutePathParams)
        } else {
            config
        })
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub tenant: TenantSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_config_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.name, "httpware");
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_server_config_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 9000

            [cors]
            allowed_origins = ["https://a.com"]
            max_age = 0

            [tenant]
            resolver = true
            required = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.cors.allowed_origins, vec!["https://a.com"]);
        assert_eq!(settings.cors.allowed_methods, CorsConfig::default().allowed_methods);
        assert!(settings.cors.allow_credentials);
        assert_eq!(settings.cors.max_age, 0);
        assert_eq!(settings.tenant.url_param_name, "tenant");
        assert!(settings.tenant.required);
    }

    #[test]
    fn test_logger_settings_conversion() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            format: "json".to_string(),
            colored: false,
        };
        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.colored);
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let settings = LoggerSettings {
            format: "xml".to_string(),
            ..Default::default()
        };
        let err = settings.into_logger_config().unwrap_err();
        assert_eq!(err.field(), Some("logger.format"));
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let shipped: Settings =
            toml::from_str(include_str!("../../config/default.toml")).unwrap();
        assert_eq!(shipped, Settings::default());
    }

    #[test]
    fn test_tenant_settings_header_only_by_default() {
        assert!(TenantSettings::default().to_tenant_config().is_none());
    }

    #[test]
    fn test_tenant_settings_to_resolver_config() {
        let settings = TenantSettings {
            resolver: true,
            url_param_name: "org".to_string(),
            path_params: true,
            required: true,
        };
        let config = settings.to_tenant_config().unwrap();
        assert_eq!(config.url_param_name, "org");
        assert!(config.required);
        assert!(config.url_param.is_some());
        assert!(config.claims_extractor.is_none());

        let without_params = TenantSettings {
            path_params: false,
            ..settings
        };
        assert!(without_params.to_tenant_config().unwrap().url_param.is_none());
    }
}
