//! Logger Module
//!
//! Console logging based on `tracing-subscriber` with support for:
//! - Full, Compact and JSON output formats
//! - Color control (only applied when stdout is a terminal)
//! - `RUST_LOG` overriding the configured level

pub mod config;
pub mod error;

// Re-export main types
pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber with the given configuration
///
/// # Errors
/// - Invalid configuration
/// - A global subscriber is already installed
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;

    let filter = build_filter(&config);
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    let result = match config.format {
        LogFormat::Full => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(use_ansi)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(use_ansi)
                    .with_target(true)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).json())
            .try_init(),
    };

    result.map_err(|e| LoggerError::init(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        format = config.format.as_str(),
        "Logger initialized"
    );
    Ok(())
}

/// `RUST_LOG` wins over the configured level when set and valid.
fn build_filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
