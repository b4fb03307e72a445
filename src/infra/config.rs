//! Configuration management infrastructure.
//!
//! This module provides configuration file support, allowing users to save
//! and load verification preferences.

use crate::domain::constants::DEFAULT_HASH_BLOCK_SIZE;
use crate::infra::error::{VerifyError, VerifyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest accepted hash block size.
pub const MIN_HASH_BLOCK_SIZE: usize = 512;

/// Largest accepted hash block size.
pub const MAX_HASH_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Application configuration with all verification preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfiguration {
    /// Block size used when streaming content through the hasher
    pub hash_block_size: usize,

    /// Whether to compare the PE image digest with the signed digest
    pub verify_image_hash: bool,

    /// Whether a verified timestamp is required for success
    pub require_timestamp: bool,

    /// Whether to show verbose output
    pub verbose: bool,
}

impl Default for VerifierConfiguration {
    fn default() -> Self {
        Self {
            hash_block_size: DEFAULT_HASH_BLOCK_SIZE,
            verify_image_hash: true,
            require_timestamp: false,
            verbose: false,
        }
    }
}

impl VerifierConfiguration {
    /// Validate configuration values
    pub fn validate(&self) -> VerifyResult<()> {
        if !(MIN_HASH_BLOCK_SIZE..=MAX_HASH_BLOCK_SIZE).contains(&self.hash_block_size) {
            return Err(VerifyError::ConfigurationError(format!(
                "hash_block_size must be between {MIN_HASH_BLOCK_SIZE} and {MAX_HASH_BLOCK_SIZE} bytes, got {}",
                self.hash_block_size
            )));
        }
        Ok(())
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> VerifyResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> VerifyResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("authenticode-verifier").join("config.toml"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("authenticode-verifier-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> VerifyResult<VerifierConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = VerifierConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file, falling back to defaults when it does
    /// not exist. Nothing is written.
    pub fn load_or_default(&self) -> VerifyResult<VerifierConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::debug!(
                "No configuration at {}, using defaults",
                self.config_path.display()
            );
            Ok(VerifierConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> VerifyResult<VerifierConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            VerifyError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: VerifierConfiguration = toml::from_str(&content).map_err(|e| {
            VerifyError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &VerifierConfiguration) -> VerifyResult<()> {
        config.validate()?;
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VerifyError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            VerifyError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            VerifyError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> VerifyResult<()> {
        let mut config = self.load_or_default()?;

        match key {
            "hash_block_size" => {
                config.hash_block_size = value.parse().map_err(|_| {
                    VerifyError::ConfigurationError(format!("Invalid block size: {value}"))
                })?;
            }
            "verify_image_hash" => config.verify_image_hash = parse_bool(value)?,
            "require_timestamp" => config.require_timestamp = parse_bool(value)?,
            "verbose" => config.verbose = parse_bool(value)?,
            _ => {
                return Err(VerifyError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

fn parse_bool(value: &str) -> VerifyResult<bool> {
    value
        .parse()
        .map_err(|_| VerifyError::ConfigurationError(format!("Invalid boolean value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_configuration() {
        let config = VerifierConfiguration::default();
        assert_eq!(config.hash_block_size, 64 * 1024);
        assert!(config.verify_image_hash);
        assert!(!config.require_timestamp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: VerifierConfiguration = toml::from_str("require_timestamp = true").unwrap();
        assert!(config.require_timestamp);
        assert_eq!(config.hash_block_size, DEFAULT_HASH_BLOCK_SIZE);
    }

    #[test]
    fn test_block_size_bounds() {
        for size in [0, 511, MAX_HASH_BLOCK_SIZE + 1] {
            let config = VerifierConfiguration {
                hash_block_size: size,
                ..VerifierConfiguration::default()
            };
            assert!(config.validate().is_err(), "size {size} accepted");
        }
    }

    #[test]
    fn test_config_manager_with_temp_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(&config_path);

        let config = manager.load_or_create_default().unwrap();
        assert!(config_path.exists());
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn test_update_value() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        manager.update_value("require_timestamp", "true").unwrap();
        manager.update_value("hash_block_size", "4096").unwrap();
        let config = manager.load().unwrap();
        assert!(config.require_timestamp);
        assert_eq!(config.hash_block_size, 4096);

        assert!(manager.update_value("hash_block_size", "12").is_err());
        assert!(manager.update_value("verbose", "maybe").is_err());
        assert!(manager.update_value("unknown", "1").is_err());
    }
}
