//! Configuration types for the logger

use serde::{Deserialize, Serialize};
use tracing::Level;

use super::error::LoggerError;

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub level: String,
    pub format: LogFormat,
    pub colored: bool,
}

impl LoggerConfig {
    /// Create a new logger configuration with validation
    pub fn new(level: impl Into<String>, format: LogFormat, colored: bool) -> Result<Self, LoggerError> {
        let config = Self {
            level: level.into(),
            format,
            colored,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LoggerError> {
        self.parse_level().map(|_| ())
    }

    /// Parse the log level string into a tracing::Level
    pub fn parse_level(&self) -> Result<Level, LoggerError> {
        match self.level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => Err(LoggerError::config(format!(
                "Invalid log level '{}'. Valid levels are: trace, debug, info, warn, error",
                self.level
            ))),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            colored: true,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggerError::config(format!(
                "Invalid log format '{}'. Valid formats are: full, compact, json",
                s
            ))),
        }
    }
}

impl LogFormat {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.format, LogFormat::Full);
        assert_eq!(config.parse_level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let result = LoggerConfig::new("verbose", LogFormat::Json, false);
        assert!(matches!(result, Err(LoggerError::Config { .. })));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Level parsing ignores case.
        #[test]
        fn prop_level_case_insensitive(
            level in prop_oneof![Just("trace"), Just("debug"), Just("info"), Just("warn"), Just("error")],
            upper in any::<bool>(),
        ) {
            let level = if upper { level.to_uppercase() } else { level.to_string() };
            let config = LoggerConfig { level, ..LoggerConfig::default() };
            prop_assert!(config.validate().is_ok());
        }
    }
}
