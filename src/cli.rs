//! Command-line interface for the demo server
//!
//! Arguments override values loaded by [`ConfigLoader`]; they have the
//! highest priority of all configuration sources.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, ConfigLoader, Environment, Settings};

/// Custom validation functions for CLI arguments
mod validation {
    use std::path::PathBuf;

    /// Validate port number is within valid range (1-65535)
    pub fn validate_port(port_str: &str) -> Result<u16, String> {
        let port: u16 = port_str.parse().map_err(|_| {
            format!(
                "Port must be a valid number between 1 and 65535, got: '{}'",
                port_str
            )
        })?;

        if port == 0 {
            return Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string());
        }

        Ok(port)
    }

    /// Validate that a configuration file exists and is a regular file
    pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
        let path = PathBuf::from(path_str);

        if !path.exists() {
            return Err(format!("Configuration file does not exist: '{}'", path_str));
        }
        if !path.is_file() {
            return Err(format!("Configuration path is not a file: '{}'", path_str));
        }

        Ok(path)
    }

    /// Validate host address format
    pub fn validate_host_address(host_str: &str) -> Result<String, String> {
        let host = host_str.trim();
        if host.is_empty() {
            return Err("Host address cannot be empty".to_string());
        }
        if host.chars().any(char::is_whitespace) {
            return Err(format!("Host address cannot contain whitespace: '{}'", host_str));
        }
        Ok(host.to_string())
    }
}

/// Demo server showing the httpware middleware pipeline
#[derive(Parser, Debug)]
#[command(name = "httpware")]
#[command(about = "Demo server for the httpware middleware pipeline")]
#[command(long_about = "
Runs a small HTTP server with request id, tenant, recovery, access logging
and CORS middleware applied, so the pipeline can be exercised with curl.

EXAMPLES:
    # Start with configuration from ./config
    httpware

    # Bind to all interfaces on port 8080
    httpware --host 0.0.0.0 --port 8080

    # Use a single configuration file
    httpware --config /etc/httpware/production.toml

    # Load config/production.toml with debug logging
    httpware --env production --verbose
")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    ///
    /// Load this TOML file instead of the layered configuration directory.
    #[arg(short, long, value_name = "FILE", value_parser = validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `{environment}.toml` layer. Available values: development
    /// (dev), test, staging (stage), production (prod).
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Host address to bind to
    #[arg(long, value_name = "ADDRESS", value_parser = validation::validate_host_address)]
    pub host: Option<String>,

    /// Port number to listen on
    #[arg(short, long, value_name = "PORT", value_parser = validation::validate_port)]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Loader honoring `--config` and `--env`.
    pub fn config_loader(&self) -> Result<ConfigLoader, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(ref path) = self.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = self.env {
            loader = loader.with_environment(env);
        }
        Ok(loader)
    }

    /// Load settings from all sources, then apply argument overrides.
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = self.config_loader()?.load()?;
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ref host) = self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.verbose {
            settings.logger.level = "debug".to_string();
        } else if self.quiet {
            settings.logger.level = "error".to_string();
        }
    }
}
