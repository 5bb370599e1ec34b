//! Configuration loader for httpware
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "HTTPWARE_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "HTTPWARE_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "HTTPWARE";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Keys whose environment values are comma separated lists
const LIST_KEYS: &[&str] = &[
    "cors.allowed_origins",
    "cors.allowed_methods",
    "cors.allowed_headers",
];

/// Configuration loader that handles layered configuration loading
///
/// The loader supports the following configuration sources (in order of priority):
/// 1. Built-in defaults of [`Settings`]
/// 2. `default.toml` (optional)
/// 3. `{environment}.toml` (optional)
/// 4. `local.toml` (optional)
/// 5. `HTTPWARE_*` environment variables (highest priority)
///
/// When a single configuration file is selected it replaces layers 2 to 4
/// and must exist.
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// If set, skips layered loading
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// This reads environment variables to determine:
    /// - Configuration directory (`HTTPWARE_CONFIG_DIR`)
    /// - Specific configuration file (`HTTPWARE_CONFIG_FILE`)
    /// - Application environment (`HTTPWARE_APP_ENV`)
    ///
    /// # Errors
    ///
    /// Returns an error if both `HTTPWARE_CONFIG_DIR` and `HTTPWARE_CONFIG_FILE`
    /// are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{CONFIG_DIR_ENV} and {CONFIG_FILE_ENV} cannot both be set. \
                 Use {CONFIG_DIR_ENV} for layered configuration or \
                 {CONFIG_FILE_ENV} for a single configuration file."
            )));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment read from `HTTPWARE_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load configuration from all sources and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The selected single configuration file does not exist
    /// - Configuration parsing fails
    /// - Configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::Parse(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match self.config_file {
            Some(ref config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, false)?;

        let env_path = self.config_dir.join(self.environment.config_file_name());
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let Some(name) = path.to_str() else {
            return Err(ConfigError::Parse(format!(
                "Configuration path is not valid UTF-8: {}",
                path.display()
            )));
        };

        Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
    }

    /// Environment variables with prefix `HTTPWARE_` are mapped to
    /// configuration keys, with `__` separating nested keys.
    ///
    /// Examples:
    /// - `HTTPWARE_SERVER__PORT` -> `server.port`
    /// - `HTTPWARE_CORS__ALLOWED_ORIGINS=https://a.com,https://b.com` -> `cors.allowed_origins`
    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        let source = LIST_KEYS.iter().fold(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(","),
            |source, key| source.with_list_parse_key(key),
        );

        builder.add_source(source)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
