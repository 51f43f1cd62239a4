//! Configuration file support.
//!
//! Category rules and duplicate-detection defaults can be customised with a
//! TOML file:
//!
//! ```toml
//! [duplicates]
//! enabled = true
//! method = "content"   # or "name"
//!
//! [categories]
//! disabled = ["Executables"]
//!
//! [[categories.custom]]
//! name = "Ebooks"
//! extensions = [".epub", ".mobi"]
//! ```

use crate::duplicates::EquivalenceMethod;
use crate::error::SortResult;
use crate::file_category::CategoryRuleTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sortdirrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub duplicates: DuplicateSettings,
    #[serde(default)]
    pub categories: CategorySettings,
}

/// Duplicate detection defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateSettings {
    /// Whether duplicate detection runs at all. Defaults to true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Equivalence rule. Defaults to content.
    #[serde(default)]
    pub method: EquivalenceMethod,
}

fn default_enabled() -> bool {
    true
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            method: EquivalenceMethod::ByContent,
        }
    }
}

/// Category table customisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySettings {
    /// Categories (built-in or custom) to leave out of the active table.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Extra categories, or replacements for built-in ones with the same name.
    #[serde(default)]
    pub custom: Vec<CustomCategory>,
}

/// A user-defined category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCategory {
    pub name: String,
    pub extensions: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sortdirrc.toml` in the current directory
    /// 3. Look for `~/.config/sortdir/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = Self::from_toml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the active rule table: the built-in table, plus custom
    /// categories, minus disabled ones.
    ///
    /// # Errors
    ///
    /// [`crate::SortError::InvalidRule`] if a custom category has an empty name
    /// or no extensions.
    pub fn rule_table(&self) -> SortResult<CategoryRuleTable> {
        let mut table = CategoryRuleTable::default();
        for custom in &self.categories.custom {
            table = table.with_rule(&custom.name, custom.extensions.as_slice())?;
        }
        for name in &self.categories.disabled {
            if !table.contains(name) {
                log::warn!("Disabled category '{}' is not defined", name);
            }
        }
        let disabled = &self.categories.disabled;
        Ok(table.retain_categories(|name| !disabled.iter().any(|d| d == name)))
    }
}
