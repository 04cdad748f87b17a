//! Configuration management for Wayfarer
//!
//! Configuration is a TOML file. Every section is optional; anything left out
//! takes the defaults from [`Config::default_config`].
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! path = "~/.local/share/wayfarer/state.db"
//!
//! [persist.tab]
//! enabled = true
//! whitelist = ["activeTab"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub persist: PersistSettings,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per slice in a directory
    File,
    /// Single SQLite database
    Sqlite,
    /// Process memory only; nothing survives a restart
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Directory (file backend) or database file (sqlite backend)
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// Persistence options per slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistSettings {
    #[serde(default = "SlicePersistConfig::full")]
    pub auth: SlicePersistConfig,

    #[serde(default = "SlicePersistConfig::tab_default")]
    pub tab: SlicePersistConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicePersistConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serialized field names to persist; `None` persists the whole slice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_path() -> String {
    "~/.local/share/wayfarer/state".to_string()
}

fn default_true() -> bool {
    true
}

impl SlicePersistConfig {
    /// Persist every field of the slice
    pub fn full() -> Self {
        Self {
            enabled: true,
            whitelist: None,
        }
    }

    /// Persist only the listed fields
    pub fn whitelist<I, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            enabled: true,
            whitelist: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            whitelist: None,
        }
    }

    fn tab_default() -> Self {
        Self::whitelist(["activeTab"])
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for PersistSettings {
    fn default() -> Self {
        Self {
            auth: SlicePersistConfig::full(),
            tab: SlicePersistConfig::tab_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: the default configuration is used.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            storage: StorageConfig::default(),
            persist: PersistSettings::default(),
        }
    }
}

impl StorageConfig {
    /// Storage path with `~` expanded
    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("WAYFARER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("wayfarer").join("config.toml"))
}
