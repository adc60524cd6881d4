//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` and caches it. A missing
//! file yields the defaults.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use pixshop_core::config::RootConfig;
use pixshop_core::error::Result;

use crate::dto::{create_config_root_migrator, ensure_version_tag};
use crate::paths::PixshopPaths;
use crate::storage::RecordFile;

/// Environment variable that overrides `generation.api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_ENTITY: &str = "config_root";

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service for the default `config.toml`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(PixshopPaths::config_file()?))
    }

    /// Creates a service for a custom config file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// Falls back to the defaults when the file cannot be read.
    pub fn get_config(&self) -> RootConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = read_lock.as_ref() {
                return cached.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to load config, using defaults");
            RootConfig::default()
        });

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Reads the config file.
    pub fn load(&self) -> Result<RootConfig> {
        let Some(mut value) = RecordFile::toml(self.path.clone()).load()? else {
            debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(RootConfig::default());
        };
        ensure_version_tag(&mut value);
        Ok(create_config_root_migrator().load_flat_from(CONFIG_ENTITY, value)?)
    }

    /// Writes `config` to the config file and refreshes the cache.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        let json = create_config_root_migrator().save_domain_flat(CONFIG_ENTITY, config.clone())?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        RecordFile::toml(self.path.clone()).save_value(&value)?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// API key for the generation service; the environment wins over the file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.get_config().generation.api_key)
    }
}
