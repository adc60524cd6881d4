//! AppSettings DTOs
//!
//! ## Version History
//! - **1.0.0**: Theme, tier, feature toggles and widget positions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use pixshop_core::settings::{AppSettings, Theme, Tier, WidgetPosition};

/// Widget position DTO V1.0.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WidgetPositionV1_0_0 {
    pub x: f32,
    pub y: f32,
}

/// App settings DTO V1.0.0
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct AppSettingsV1_0_0 {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
    #[serde(default)]
    pub widget_positions: BTreeMap<String, WidgetPositionV1_0_0>,
}

impl IntoDomain<AppSettings> for AppSettingsV1_0_0 {
    fn into_domain(self) -> AppSettings {
        AppSettings {
            theme: self.theme,
            tier: self.tier,
            toggles: self.toggles,
            widget_positions: self
                .widget_positions
                .into_iter()
                .map(|(id, p)| (id, WidgetPosition { x: p.x, y: p.y }))
                .collect(),
        }
    }
}

impl FromDomain<AppSettings> for AppSettingsV1_0_0 {
    fn from_domain(settings: AppSettings) -> Self {
        AppSettingsV1_0_0 {
            theme: settings.theme,
            tier: settings.tier,
            toggles: settings.toggles,
            widget_positions: settings
                .widget_positions
                .into_iter()
                .map(|(id, p)| (id, WidgetPositionV1_0_0 { x: p.x, y: p.y }))
                .collect(),
        }
    }
}

/// Creates a Migrator for AppSettings.
pub fn create_settings_migrator() -> version_migrate::Migrator {
    version_migrate::migrator!("app_settings" => [
        AppSettingsV1_0_0,
        AppSettings
    ], save = true)
    .expect("Failed to create app_settings migrator")
}
