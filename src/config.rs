//! Configuration loading
//!
//! A TOML file with every field optional:
//!
//! ```toml
//! log_level = "debug"
//!
//! [channel]
//! name = "/GUI"
//! size = 4096
//! ```

use crate::channel::ChannelConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,
    /// Shared memory channel.
    pub channel: ChannelConfig,
}

impl AppConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the channel name is not a
    /// valid shared memory name or the size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.channel
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.channel.name, "/GUI");
        assert_eq!(config.channel.size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::default()), tracing::Level::INFO);
    }

    #[test]
    fn test_load_full() {
        let file = write_config(
            r#"
log_level = "debug"

[channel]
name = "/buzzer"
size = 1024
"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.channel.name, "/buzzer");
        assert_eq!(config.channel.size, 1024);
    }

    #[test]
    fn test_load_partial() {
        let file = write_config("[channel]\nsize = 512\n");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.channel.name, "/GUI");
        assert_eq!(config.channel.size, 512);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/buzzer.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound));
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = write_config("log_level = [");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));

        let file = write_config("log_level = \"loud\"");
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.channel.name = "GUI".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.channel.name = "/GUI".to_string();
        config.channel.size = 0;
        assert!(config.validate().is_err());
    }
}
