//! Settings repository trait.

use async_trait::async_trait;

use super::model::AppSettings;
use crate::error::Result;

/// Persistence boundary for [`AppSettings`].
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads settings; a missing settings file yields the defaults.
    async fn load(&self) -> Result<AppSettings>;

    async fn save(&self, settings: &AppSettings) -> Result<()>;
}
