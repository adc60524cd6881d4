//! External image generation collaborator.
//!
//! The hosted model is opaque to the core: it takes a prompt (and optionally
//! a source image) and answers with an embedded `data:` image string, or
//! fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image::ImageFile;

/// Failure reported by the generation service.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationError {
    /// The provider refused the request on safety grounds
    #[error("Request blocked by the provider: {reason}")]
    SafetyBlocked { reason: String },

    /// The response carried no usable image
    #[error("Provider returned no image: {0}")]
    NoImage(String),

    /// The provider returned image data that could not be decoded
    #[error("Provider returned malformed image data: {0}")]
    MalformedImage(String),

    /// Transport or HTTP level failure
    #[error("Provider error (status {status_code:?}): {message}")]
    Provider {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
    },

    /// The request could not be built (missing credentials, empty prompt)
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::SafetyBlocked { reason } => {
                format!("The request was blocked ({reason}). Try rephrasing your prompt.")
            }
            Self::NoImage(_) | Self::MalformedImage(_) => {
                "The AI did not return an image. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { is_retryable: true, .. })
    }
}

/// Per-request generation options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model override; the service default is used when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Extra instruction appended to the prompt (e.g. "keep the background").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_hint: Option<String>,
}

/// A hosted generative-image API.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produces a new image from a prompt alone.
    ///
    /// Returns an embedded `data:<mime>;base64,...` string.
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;

    /// Produces a new image from `source` guided by a prompt.
    ///
    /// Returns an embedded `data:<mime>;base64,...` string.
    async fn transform(
        &self,
        source: &ImageFile,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_display_includes_status() {
        let err = GenerationError::Provider {
            status_code: Some(503),
            message: "overloaded".into(),
            is_retryable: true,
        };
        assert_eq!(err.to_string(), "Provider error (status Some(503)): overloaded");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_message_for_safety_block() {
        let err = GenerationError::SafetyBlocked {
            reason: "SAFETY".into(),
        };
        assert!(err.user_message().contains("blocked"));
        assert!(!err.is_retryable());
    }
}
