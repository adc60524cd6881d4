//! Application configuration domain model (`config.toml`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Settings for the hosted generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    /// API key; the `GEMINI_API_KEY` environment variable takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            api_key: None,
            temperature: None,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootConfig {
    /// Overrides the directory holding the session store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    /// Default tracing filter when no environment filter is set.
    pub log_level: String,
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            generation: GenerationSettings::default(),
        }
    }
}
