//! Logging setup for the server binary

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};
use crate::config::LoggingSettings;
use crate::{Error, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
        }
    }
}

impl LoggingConfig {
    /// Build from the `[logging]` section of the service configuration
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self> {
        let config = LoggingConfig {
            level: parse_log_level(&settings.level)?,
            json: settings.json,
            ..Default::default()
        };

        Ok(if settings.file_info { config.with_file_info() } else { config })
    }

    /// Enable file and line information in logs
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }
}

/// Set up the logging system with the provided configuration
///
/// `RUST_LOG` directives are honoured on top of the configured level.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(config.level.into());

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level)
        .map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}
