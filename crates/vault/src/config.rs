//! Configuration management for DocVault.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/docvault/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use model::MIN_PASSWORD_LENGTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("min_password_length must be between 4 and 128, got {0}")]
    InvalidPasswordLength(usize),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("keychain_service and keychain_key must not be empty")]
    EmptyKeychainName,
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for the configurable password length.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Storage locations and logging.
    pub vault: VaultConfig,

    /// Credential settings.
    pub security: SecurityConfig,
}

/// Storage locations and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// Sandbox root; nothing outside it can be listed or changed.
    pub documents_dir: PathBuf,

    /// Directory for the preferences database.
    pub data_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

/// Credential settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Keychain service name.
    pub keychain_service: String,

    /// Keychain key holding the vault secret.
    pub keychain_key: String,

    /// Shortest accepted password.
    pub min_password_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            documents_dir: data_dir.join("Documents"),
            data_dir,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            keychain_service: storage::DEFAULT_SERVICE.to_string(),
            keychain_key: storage::DEFAULT_KEY.to_string(),
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docvault")
        .join("config.toml")
}

/// Returns the default data directory path.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docvault")
}

impl Config {
    /// Path of the preferences database.
    pub fn preferences_db_path(&self) -> PathBuf {
        self.vault.data_dir.join("preferences.db")
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported variables:
    /// - DOCVAULT_DOCUMENTS_DIR: Override the documents root
    /// - DOCVAULT_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("DOCVAULT_DOCUMENTS_DIR") {
            if !dir.is_empty() {
                tracing::info!("Overriding documents_dir from environment: {}", dir);
                self.vault.documents_dir = PathBuf::from(dir);
            }
        }

        if let Ok(level) = std::env::var("DOCVAULT_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.vault.log_level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = self.security.min_password_length;
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&min) {
            return Err(ConfigError::InvalidPasswordLength(min));
        }

        if self.security.keychain_service.trim().is_empty()
            || self.security.keychain_key.trim().is_empty()
        {
            return Err(ConfigError::EmptyKeychainName);
        }

        let level = self.vault.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.vault.log_level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.vault.log_level, "info");
        assert!(config.vault.log_file.is_none());
        assert!(config.vault.documents_dir.ends_with("Documents"));
        assert!(config.vault.data_dir.to_string_lossy().contains("docvault"));
        assert_eq!(config.security.keychain_service, "docvault");
        assert_eq!(config.security.keychain_key, "master_password");
        assert_eq!(config.security.min_password_length, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preferences_db_path() {
        let mut config = Config::default();
        config.vault.data_dir = PathBuf::from("/var/lib/docvault");
        assert_eq!(
            config.preferences_db_path(),
            PathBuf::from("/var/lib/docvault/preferences.db")
        );
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[vault]
log_level = "debug"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.vault.log_level, "debug");
        assert_eq!(config.security, SecurityConfig::default());
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[vault]
documents_dir = "/srv/docs"
data_dir = "/srv/data"
log_level = "trace"
log_file = "/srv/data/docvault.log"

[security]
keychain_service = "custom"
keychain_key = "secret"
min_password_length = 8
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.vault.documents_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.vault.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.vault.log_level, "trace");
        assert_eq!(
            config.vault.log_file,
            Some(PathBuf::from("/srv/data/docvault.log"))
        );
        assert_eq!(config.security.keychain_service, "custom");
        assert_eq!(config.security.keychain_key, "secret");
        assert_eq!(config.security.min_password_length, 8);
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let toml = r#"
[vault
log_level = "debug"
"#;
        let err = Config::from_toml(toml).unwrap_err().to_string();
        assert!(err.contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let toml = r#"
[security]
min_password_length = "four"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        let mut config = Config::default();
        config.security.min_password_length = 3;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPasswordLength(3))
        );

        config.security.min_password_length = 129;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPasswordLength(129))
        );

        config.security.min_password_length = 128;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.vault.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );

        config.vault.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_keychain_names() {
        let mut config = Config::default();
        config.security.keychain_key = " ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyKeychainName));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.vault.documents_dir = temp_dir.path().join("docs");
        config.security.min_password_length = 6;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_env_override_documents_dir() {
        std::env::set_var("DOCVAULT_DOCUMENTS_DIR", "/tmp/docvault-env-docs");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(
            config.vault.documents_dir,
            PathBuf::from("/tmp/docvault-env-docs")
        );

        std::env::remove_var("DOCVAULT_DOCUMENTS_DIR");
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        std::env::set_var("DOCVAULT_DOCUMENTS_DIR", "");
        std::env::remove_var("DOCVAULT_LOG_LEVEL");

        let mut config = Config::default();
        let original = config.vault.documents_dir.clone();
        config.apply_env_overrides();
        assert_eq!(config.vault.documents_dir, original);

        std::env::remove_var("DOCVAULT_DOCUMENTS_DIR");
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        std::env::remove_var("DOCVAULT_DOCUMENTS_DIR");
        std::env::set_var("DOCVAULT_LOG_LEVEL", "debug");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.vault.log_level, "debug");

        std::env::remove_var("DOCVAULT_LOG_LEVEL");
    }
}
