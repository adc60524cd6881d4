//! Wiring shared by all commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use pixshop_application::{EditorSession, SessionManager};
use pixshop_core::config::RootConfig;
use pixshop_core::generation::{GenerationConfig, GenerationError, GenerationService};
use pixshop_core::image::ImageFile;
use pixshop_core::settings::{AppSettings, SettingsRepository};
use pixshop_infrastructure::paths::PixshopPaths;
use pixshop_infrastructure::{ConfigService, FileSessionStore, FileSettingsRepository};
use pixshop_interaction::GeminiImageService;

pub struct AppContext {
    pub config: RootConfig,
    config_service: ConfigService,
    pub store_dir: PathBuf,
    pub settings: FileSettingsRepository,
}

impl AppContext {
    /// Resolves config, store location and settings file.
    pub fn load(config_path: Option<PathBuf>, store_dir: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new().context("Failed to resolve config directory")?,
        };
        let config = config_service.get_config();

        let store_dir = match store_dir.or_else(|| config.store_dir.clone()) {
            Some(dir) => dir,
            None => PixshopPaths::store_dir().context("Failed to resolve data directory")?,
        };

        let settings =
            FileSettingsRepository::new().context("Failed to resolve settings file")?;

        Ok(Self {
            config,
            config_service,
            store_dir,
            settings,
        })
    }

    pub async fn load_settings(&self) -> Result<AppSettings> {
        self.settings
            .load()
            .await
            .context("Failed to load settings")
    }

    /// Builds the editor over the configured store and restores the last
    /// session.
    pub async fn editor(&self) -> Result<EditorSession> {
        debug!(store = %self.store_dir.display(), "Opening session store");
        let store = Arc::new(FileSessionStore::new(self.store_dir.clone()));
        let manager = Arc::new(SessionManager::new(store));
        let settings = match self.load_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Falling back to default settings");
                AppSettings::default()
            }
        };

        let mut editor =
            EditorSession::new(self.generator(), manager).with_flags(settings.session_flags());
        editor.restore().await;
        Ok(editor)
    }

    fn generator(&self) -> Arc<dyn GenerationService> {
        match GeminiImageService::from_settings(&self.config.generation, self.config_service.api_key())
        {
            Ok(service) => Arc::new(service),
            Err(e) => Arc::new(Unavailable(e)),
        }
    }
}

/// Stands in for the generation service when it cannot be configured, so
/// that history commands keep working without an API key.
struct Unavailable(GenerationError);

#[async_trait]
impl GenerationService for Unavailable {
    async fn generate(&self, _: &str, _: &GenerationConfig) -> Result<String, GenerationError> {
        Err(self.0.clone())
    }

    async fn transform(
        &self,
        _: &ImageFile,
        _: &str,
        _: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        Err(self.0.clone())
    }
}
