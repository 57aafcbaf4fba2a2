//! Configuration management for the claims server.
//!
//! This module handles loading and validation of server configuration from
//! TOML files. Command-line overrides are applied by the caller before
//! validation.

use plugin_claims::ClaimRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

fn default_stats_interval_secs() -> u64 {
    60
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where regions are persisted
    #[serde(default)]
    pub storage: StorageSettings,
    /// Limits for player-created claims
    #[serde(default)]
    pub claims: ClaimRules,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

/// Region store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON document on disk
    Json,
    /// Process memory only; everything is lost on exit
    Memory,
}

/// Region store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Path of the JSON document, used by the `json` backend
    pub path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: "data/regions.json".to_string(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Periodic statistics reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Seconds between cache statistics lines; 0 disables reporting
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates it with default values and returns
    /// the default configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.path)
    }

    /// Validates the configuration settings.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error message describing
    /// the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.backend == StorageBackend::Json && self.storage.path.trim().is_empty() {
            return Err("storage.path cannot be empty for the json backend".to_string());
        }

        let claims = &self.claims;
        if claims.max_size == 0 {
            return Err("claims.max_size must be greater than 0".to_string());
        }
        if claims.default_size == 0 || claims.default_size % 2 == 0 {
            return Err(format!(
                "claims.default_size must be a positive odd number, got {}",
                claims.default_size
            ));
        }
        if claims.default_size > claims.max_size {
            return Err(format!(
                "claims.default_size ({}) exceeds claims.max_size ({})",
                claims.default_size, claims.max_size
            ));
        }
        if claims.max_name_length == 0 {
            return Err("claims.max_name_length must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};
    use tokio::fs;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.storage.path, "data/regions.json");
        assert_eq!(config.claims.default_size, 21);
        assert_eq!(config.claims.max_size, 101);
        assert_eq!(config.claims.max_name_length, 32);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.monitoring.stats_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.claims.default_size = 20;
        assert!(config.validate().is_err());

        config.claims.default_size = 201;
        assert!(config.validate().is_err());

        config.claims.default_size = 21;
        config.claims.max_name_length = 0;
        assert!(config.validate().is_err());

        config.claims.max_name_length = 32;
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        config.storage.path = "  ".to_string();
        assert!(config.validate().is_err());

        // The memory backend ignores the path
        config.storage.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.claims.default_size, 21);

        // Should create the file with the defaults
        assert!(path.exists());
        let written = fs::read_to_string(&path).await.unwrap();
        let reparsed: AppConfig = toml::from_str(&written).unwrap();
        assert_eq!(reparsed.storage.path, config.storage.path);
        assert_eq!(reparsed.claims, config.claims);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[storage]
backend = "memory"
path = "/srv/claims/regions.json"

[claims]
default_size = 15
max_size = 63

[logging]
level = "debug"
json_format = true

[monitoring]
stats_interval_secs = 0
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage_path(), PathBuf::from("/srv/claims/regions.json"));
        assert_eq!(config.claims.default_size, 15);
        assert_eq!(config.claims.max_size, 63);
        // Missing keys fall back to defaults
        assert_eq!(config.claims.max_name_length, 32);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.monitoring.stats_interval_secs, 0);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[logging]\nlevel = \"warn\"\njson_format = false\n")
            .await
            .unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.monitoring.stats_interval_secs, 60);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[claims\nmax_size = ").await.unwrap();

        assert!(AppConfig::load_from_file(temp_file.path()).await.is_err());
    }
}
