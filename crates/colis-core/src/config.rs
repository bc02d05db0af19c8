//! Application configuration management.
//!
//! This module handles loading and saving the console configuration, which
//! includes the API base URL, request timeout, token storage backend and
//! last used username.
//!
//! Configuration is stored at `~/.config/colis-console/config.json`.
//! Environment variables take precedence over the file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, TokenStorage, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "colis-console";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides the API base URL
pub const BASE_URL_ENV: &str = "COLIS_API_BASE_URL";

/// Overrides the request timeout, in milliseconds
pub const TIMEOUT_ENV: &str = "COLIS_API_TIMEOUT_MS";

/// Where tokens are persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the token file
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory for log files
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve connection settings from the environment, then this file,
    /// then built-in defaults.
    pub fn api_config(&self) -> Result<ApiConfig> {
        self.api_config_with(|key| std::env::var(key).ok())
    }

    fn api_config_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<ApiConfig> {
        let base_url = env(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match env(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number of milliseconds", TIMEOUT_ENV))?;
                Duration::from_millis(ms)
            }
            None => self
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(ApiConfig { base_url, timeout })
    }

    /// Open the configured token store
    pub fn token_store(&self) -> Result<TokenStore> {
        let storage: Arc<dyn TokenStorage> = match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(TokenStore::new(storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = Config::default().api_config_with(no_env).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_file_values_apply() {
        let config = Config {
            base_url: Some("https://colis.example.com/api".to_string()),
            timeout_ms: Some(5000),
            ..Default::default()
        };
        let api = config.api_config_with(no_env).unwrap();
        assert_eq!(api.base_url, "https://colis.example.com/api");
        assert_eq!(api.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config {
            base_url: Some("https://file.example.com/api".to_string()),
            timeout_ms: Some(5000),
            ..Default::default()
        };
        let api = config
            .api_config_with(|key| match key {
                BASE_URL_ENV => Some("https://env.example.com/api".to_string()),
                TIMEOUT_ENV => Some("750".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(api.base_url, "https://env.example.com/api");
        assert_eq!(api.timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_invalid_timeout_env() {
        let result = Config::default().api_config_with(|key| {
            (key == TIMEOUT_ENV).then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            storage: StorageBackend::Keyring,
            last_username: Some("amina".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::Keyring);
        assert_eq!(loaded.last_username.as_deref(), Some("amina"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(loaded.storage, StorageBackend::File);
        assert!(loaded.base_url.is_none());
    }
}
