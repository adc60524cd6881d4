//! Root configuration DTOs (`config.toml`).
//!
//! ## Version History
//! - **1.0.0**: store_dir, log_level and the generation table

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use pixshop_core::config::{DEFAULT_GENERATION_MODEL, DEFAULT_LOG_LEVEL, GenerationSettings, RootConfig};

/// Generation settings DTO V1.0.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettingsV1_0_0 {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationSettingsV1_0_0 {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            temperature: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Root config DTO V1.0.0
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct ConfigRootV1_0_0 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub generation: GenerationSettingsV1_0_0,
}

impl IntoDomain<RootConfig> for ConfigRootV1_0_0 {
    fn into_domain(self) -> RootConfig {
        RootConfig {
            store_dir: self.store_dir,
            log_level: self.log_level,
            generation: GenerationSettings {
                model: self.generation.model,
                api_key: self.generation.api_key,
                temperature: self.generation.temperature,
            },
        }
    }
}

impl FromDomain<RootConfig> for ConfigRootV1_0_0 {
    fn from_domain(config: RootConfig) -> Self {
        ConfigRootV1_0_0 {
            store_dir: config.store_dir,
            log_level: config.log_level,
            generation: GenerationSettingsV1_0_0 {
                model: config.generation.model,
                api_key: config.generation.api_key,
                temperature: config.generation.temperature,
            },
        }
    }
}

/// Creates a Migrator for the root configuration.
pub fn create_config_root_migrator() -> version_migrate::Migrator {
    version_migrate::migrator!("config_root" => [
        ConfigRootV1_0_0,
        RootConfig
    ], save = true)
    .expect("Failed to create config_root migrator")
}
