//! File-based settings repository.
//!
//! Stores [`AppSettings`] as versioned TOML (`settings.toml`), separate from
//! the session store so that clearing or resetting a session never touches
//! the user's preferences.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;
use version_migrate::Migrator;

use pixshop_core::PixshopError;
use pixshop_core::error::Result;
use pixshop_core::settings::{AppSettings, SettingsRepository};

use crate::dto::{create_settings_migrator, ensure_version_tag};
use crate::paths::PixshopPaths;
use crate::storage::RecordFile;

const SETTINGS_ENTITY: &str = "app_settings";

pub struct FileSettingsRepository {
    path: PathBuf,
}

impl FileSettingsRepository {
    /// Creates a repository at the default location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(PixshopPaths::settings_file()?))
    }

    /// Creates a repository with a custom file path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_sync(path: &Path, migrator: &Migrator) -> Result<AppSettings> {
        let Some(mut value) = RecordFile::toml(path.to_path_buf()).load()? else {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(AppSettings::default());
        };
        ensure_version_tag(&mut value);
        Ok(migrator.load_flat_from(SETTINGS_ENTITY, value)?)
    }

    fn save_sync(path: &Path, migrator: &Migrator, settings: AppSettings) -> Result<()> {
        let json = migrator.save_domain_flat(SETTINGS_ENTITY, settings)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        RecordFile::toml(path.to_path_buf()).save_value(&value)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for FileSettingsRepository {
    async fn load(&self) -> Result<AppSettings> {
        let path = self.path.clone();
        task::spawn_blocking(move || Self::load_sync(&path, &create_settings_migrator()))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }

    async fn save(&self, settings: &AppSettings) -> Result<()> {
        let path = self.path.clone();
        let settings = settings.clone();
        task::spawn_blocking(move || Self::save_sync(&path, &create_settings_migrator(), settings))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }
}
