//! Configuration file handling for `~/.tilequeue/config.ini`.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::coordinator::RenderQueueConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Write a commented INI file to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_ini_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// The commented INI text `save_to` would write.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Write the default config file unless one exists. Returns its path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        Self::ensure_exists_at(&config_file_path())
    }

    pub fn ensure_exists_at(path: &Path) -> Result<PathBuf, ConfigFileError> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }
        Ok(path.to_path_buf())
    }

    /// Render queue settings derived from the file.
    pub fn render_queue_config(&self) -> RenderQueueConfig {
        let mut config = RenderQueueConfig::new()
            .with_inflation_px(self.render.inflation_px)
            .with_background(self.render.background)
            .with_notify_on_drain(self.render.notify_on_drain);
        if let Some(max_tiles) = self.cache.max_tiles {
            config = config.with_cache_capacity(max_tiles);
        }
        config
    }
}

/// The config directory, `~/.tilequeue`.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilequeue")
}

/// The config file, `~/.tilequeue/config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
