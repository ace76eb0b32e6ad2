//! Configuration management for txview
//!
//! This module handles loading, validation, and management of
//! txview configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Transaction source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the JSON file holding the transaction list
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    /// User whose transactions are fetched
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            user_id: default_user_id(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("./data/transactions.json")
}

fn default_user_id() -> String {
    "Fake-ID".to_string()
}

/// Preference store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Path to the preference file
    #[serde(default = "default_preferences_path")]
    pub path: PathBuf,
    /// Key under which the sort preference is stored
    #[serde(default = "default_sort_key")]
    pub sort_key: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
            sort_key: default_sort_key(),
        }
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}

fn default_sort_key() -> String {
    "transactions-sort-config".to_string()
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Seconds a delete error stays visible before it expires
    #[serde(default = "default_delete_error_ttl")]
    pub delete_error_ttl_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            delete_error_ttl_secs: default_delete_error_ttl(),
        }
    }
}

fn default_delete_error_ttl() -> u64 {
    5
}

/// Amount and date formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// chrono format string for transaction timestamps
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            date_format: default_date_format(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

fn default_date_format() -> String {
    "%d.%m.%Y %H:%M".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Transaction source settings
    #[serde(default)]
    pub source: SourceConfig,
    /// Preference store settings
    #[serde(default)]
    pub preferences: PreferencesConfig,
    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.user_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.user_id".to_string(),
                reason: "User id must not be empty".to_string(),
            });
        }

        if self.preferences.sort_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "preferences.sort_key".to_string(),
                reason: "Sort preference key must not be empty".to_string(),
            });
        }

        if self.notifications.delete_error_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notifications.delete_error_ttl_secs".to_string(),
                reason: "Delete error lifetime must be greater than 0".to_string(),
            });
        }

        if self.display.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "display.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigErrorCode;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.source.user_id, "Fake-ID");
        assert_eq!(config.preferences.sort_key, "transactions-sort-config");
        assert_eq!(config.notifications.delete_error_ttl_secs, 5);
        assert_eq!(config.display.decimal_places, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_template_is_valid() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.source.path, PathBuf::from("./data/transactions.json"));
        assert_eq!(config.display.date_format, "%d.%m.%Y %H:%M");
    }

    #[test]
    fn test_partial_sections() {
        let yaml = "source:\n  user_id: user-42\nlogging:\n  level: debug\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.source.user_id, "user-42");
        assert_eq!(config.source.path, PathBuf::from("./data/transactions.json"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("source: [unclosed").unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::InvalidYaml);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = Config::from_yaml("display:\n  decimal_places: 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "display.decimal_places"));

        let err = Config::from_yaml("notifications:\n  delete_error_ttl_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "notifications.delete_error_ttl_secs"));

        let err = Config::from_yaml("logging:\n  level: loud\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "logging.level"));

        let err = Config::from_yaml("preferences:\n  sort_key: ''\n").unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::InvalidValue);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/txview/config.yaml")).unwrap_err();
        assert_eq!(err.code(), ConfigErrorCode::FileNotFound);
    }
}
