//! Error types for the Pixshop application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::GenerationError;

/// A shared error type for the entire Pixshop application.
///
/// Persistence failures (`MalformedDataUrl`, `BackendUnavailable`,
/// `LegacyDecode`) are contained by the session manager and only logged.
/// `GenerationProvider` is surfaced to the caller.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PixshopError {
    /// An embedded `data:` string could not be parsed
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),

    /// The persistent store could not be opened, read or written
    #[error("Session store unavailable during {operation}: {message}")]
    BackendUnavailable { operation: String, message: String },

    /// A legacy base64 entry failed to decode
    #[error("Legacy entry {index} could not be decoded: {message}")]
    LegacyDecode { index: usize, message: String },

    /// The external generation service failed or returned no image
    #[error("Generation failed: {0}")]
    GenerationProvider(#[from] GenerationError),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PixshopError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a MalformedDataUrl error
    pub fn malformed_data_url(message: impl Into<String>) -> Self {
        Self::MalformedDataUrl(message.into())
    }

    /// Creates a BackendUnavailable error for the named store operation
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a LegacyDecode error for the entry at `index`
    pub fn legacy_decode(index: usize, message: impl Into<String>) -> Self {
        Self::LegacyDecode {
            index,
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error belongs to the persistence subsystem.
    ///
    /// These errors are never surfaced to the user; the in-memory timeline
    /// stays authoritative.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::MalformedDataUrl(_)
                | Self::BackendUnavailable { .. }
                | Self::LegacyDecode { .. }
                | Self::Io { .. }
                | Self::Serialization { .. }
                | Self::Migration(_)
        )
    }

    /// Check if this is a generation failure
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::GenerationProvider(_))
    }

    /// Check if this is a BackendUnavailable error
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PixshopError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PixshopError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PixshopError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PixshopError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for PixshopError {
    fn from(err: version_migrate::MigrationError) -> Self {
        use version_migrate::MigrationError;

        match err {
            MigrationError::DeserializationError(_) | MigrationError::SerializationError(_) => {
                Self::Serialization {
                    format: "migration".to_string(),
                    message: err.to_string(),
                }
            }
            MigrationError::IoError { .. } => Self::Io {
                message: err.to_string(),
            },
            _ => Self::Migration(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for PixshopError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, PixshopError>`.
pub type Result<T> = std::result::Result<T, PixshopError>;
