//! Configuration file support for Domyn.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/domyn/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Local storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote document store configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Mirror every command to the document store
    #[serde(default)]
    pub enabled: bool,

    /// Root of the document tree; `<data_dir>/remote` when unset
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,

    /// Authenticated user id
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Form validation limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_custom_name_max_len")]
    pub custom_name_max_len: usize,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            custom_name_max_len: default_custom_name_max_len(),
            min_password_length: default_min_password_length(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("domyn")
}

fn default_custom_name_max_len() -> usize {
    12
}

fn default_min_password_length() -> usize {
    6
}

impl RemoteConfig {
    /// Resolve the document tree root against the data directory
    pub fn documents_dir(&self, data_dir: &Path) -> PathBuf {
        self.documents_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("remote"))
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("domyn").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.remote.enabled);
        assert!(config.remote.user_id.is_none());
        assert_eq!(config.validation.custom_name_max_len, 12);
        assert_eq!(config.validation.min_password_length, 6);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.remote.user_id = Some("uid-42".into());
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.remote.user_id.as_deref(), Some("uid-42"));
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[validation]
custom_name_max_len = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validation.custom_name_max_len, 20);
        assert_eq!(config.validation.min_password_length, 6); // default
    }

    #[test]
    fn test_documents_dir_defaults_under_data_dir() {
        let remote = RemoteConfig::default();
        let dir = remote.documents_dir(Path::new("/tmp/domyn"));
        assert_eq!(dir, PathBuf::from("/tmp/domyn/remote"));
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.remote.enabled = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.remote.enabled);
    }
}
