//! Path management for Pixshop files.
//!
//! Paths are resolved through `AppPaths` from version-migrate so that
//! config and data land in the platform's usual places.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/pixshop/           # Config directory
//! ├── config.toml              # Application configuration
//! └── settings.toml            # Theme, tier, toggles, widget positions
//!
//! ~/.local/share/pixshop/      # Data directory
//! └── store/                   # Session store (FileSessionStore)
//!     ├── meta.json
//!     └── session/current.json
//! ```

use std::path::PathBuf;
use thiserror::Error;
use version_migrate::AppPaths;

use pixshop_core::PixshopError;

const APP_NAME: &str = "pixshop";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for PixshopError {
    fn from(err: PathError) -> Self {
        PixshopError::config(err.to_string())
    }
}

pub struct PixshopPaths;

impl PixshopPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new(APP_NAME)
    }

    /// Returns the configuration directory (e.g. `~/.config/pixshop/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g. `~/.local/share/pixshop/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn settings_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("settings.toml"))
    }

    /// Default root of the session store.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        if let Ok(config) = PixshopPaths::config_file() {
            assert!(config.ends_with("config.toml"));
        }
        if let Ok(store) = PixshopPaths::store_dir() {
            assert!(store.ends_with("store"));
        }
    }
}
