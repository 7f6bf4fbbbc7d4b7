use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::library::DEFAULT_MAX_GENRES;

const APP_DIR: &str = "pictotalk";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for user pictograms and the key-value storage
    pub data_dir: PathBuf,
    /// Bundled catalog images and sounds
    pub assets_dir: PathBuf,
    pub max_genres: usize,
    pub default_volume: f32,
    pub shuffle_by_default: bool,
    pub preferred_device: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            assets_dir: data_dir.join("assets"),
            data_dir,
            max_genres: DEFAULT_MAX_GENRES,
            default_volume: 0.8,
            shuffle_by_default: false,
            preferred_device: None,
        }
    }
}

impl AppConfig {
    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }
}

/// Loads and saves `config.toml`
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Use an explicit file; a missing file gives the defaults
    pub fn with_path(config_path: PathBuf) -> Result<Self, ConfigError> {
        let config = Self::load_config(&config_path)?;
        Ok(Self { config, config_path })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn update_config<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        updater(&mut self.config);
        self.save_config()
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), ConfigError> {
        self.config.default_volume = volume.clamp(0.0, 1.0);
        self.save_config()
    }

    pub fn set_preferred_device(&mut self, device: Option<String>) -> Result<(), ConfigError> {
        self.config.preferred_device = device;
        self.save_config()
    }

    pub fn set_shuffle_by_default(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.shuffle_by_default = enabled;
        self.save_config()
    }

    pub fn set_max_genres(&mut self, max: usize) -> Result<(), ConfigError> {
        self.config.max_genres = max.max(1);
        self.save_config()
    }

    pub fn set_data_dir(&mut self, data_dir: PathBuf) -> Result<(), ConfigError> {
        self.config.data_dir = data_dir;
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = AppConfig::default();
        self.save_config()
    }

    fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(".config")
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn save_config(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.config)?;
        std::fs::write(&self.config_path, content)?;
        log::debug!("Saved config to {}", self.config_path.display());
        Ok(())
    }
}
