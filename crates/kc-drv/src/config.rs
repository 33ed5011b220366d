//! Configuration module for the kc-drv CLI.
//!
//! This module handles loading, saving, and managing configuration
//! settings for the driver.

use dirs::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DrvError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "kc.toml";

/// Application configuration structure.
///
/// This struct represents the complete configuration for the kc-drv CLI,
/// including global settings and `check`-specific options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Global verbose setting.
    #[serde(default)]
    pub verbose: bool,

    /// `check`-specific configuration.
    #[serde(default)]
    pub check: CheckConfig,
}

/// `check`-specific configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckConfig {
    /// Directory fixture paths are resolved against when given relatively.
    #[serde(default = "default_fixture_dir")]
    pub fixture_dir: String,

    /// Whether to fail (non-zero exit) on the first diagnostic or collect
    /// and report every one found by `SemaError::Multi`.
    #[serde(default = "default_true")]
    pub fail_fast: bool,
}

fn default_fixture_dir() -> String {
    "fixtures".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self { verbose: false, check: CheckConfig::default() }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { fixture_dir: default_fixture_dir(), fail_fast: true }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Searches for configuration in the following order:
    /// 1. Current directory
    /// 2. User's home directory
    /// 3. System configuration directory
    ///
    /// Returns the default configuration if no config file is found.
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        match config_path {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DrvError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DrvError::Config(format!("failed to parse configuration: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DrvError::Config(format!("failed to serialize configuration: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("kc").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("kc").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Find the configuration file in standard locations.
    fn find_config_file() -> Result<Option<PathBuf>> {
        Ok(Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config))
    }
}
