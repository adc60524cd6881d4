//! History entry domain model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::image::ImageFile;

/// Prefix that marks a self-describing embedded data string.
pub const DATA_URL_PREFIX: &str = "data:";

/// How a history entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Image supplied by the user.
    Upload,
    /// Image produced from a prompt alone.
    Generation,
    /// Localized retouch of the current image.
    Edit,
    /// Whole-image transformation (filter, adjustment, crop).
    Transformation,
}

impl EntryKind {
    /// Kind assumed for a legacy entry that was stored without one.
    ///
    /// The first image of a session is always the upload; everything after
    /// it was derived from it.
    pub fn legacy_default(index: usize) -> Self {
        if index == 0 { Self::Upload } else { Self::Edit }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Upload => "upload",
            Self::Generation => "generation",
            Self::Edit => "edit",
            Self::Transformation => "transformation",
        };
        f.write_str(label)
    }
}

/// The image a history entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// Binary image held in memory.
    Binary(ImageFile),
    /// Opaque remote URL, kept verbatim.
    RemoteUrl(String),
    /// Inline `data:<mime>;base64,...` string from older sessions.
    LegacyEncoded(String),
}

impl EntryContent {
    /// Classifies a string image source.
    ///
    /// Strings carrying the embedded-data prefix are inline data, anything
    /// else is treated as a remote URL.
    pub fn from_source(source: impl Into<String>) -> Self {
        let source = source.into();
        if source.starts_with(DATA_URL_PREFIX) {
            Self::LegacyEncoded(source)
        } else {
            Self::RemoteUrl(source)
        }
    }

    /// Returns the binary handle, if this content is held in memory.
    pub fn as_binary(&self) -> Option<&ImageFile> {
        match self {
            Self::Binary(file) => Some(file),
            _ => None,
        }
    }

    /// Returns true if this is a degraded placeholder with no data.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Binary(file) if file.is_empty())
    }
}

/// One step in the user's edit timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// The image of this step.
    pub content: EntryContent,
    /// How this step was produced.
    pub kind: EntryKind,
    /// Prompt that produced this step, if any.
    pub prompt: Option<String>,
    /// Creation time in milliseconds since the UNIX epoch.
    pub created_at: i64,
}

impl HistoryEntry {
    /// Creates a new entry stamped with the current time.
    pub fn new(content: EntryContent, kind: EntryKind, prompt: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            kind,
            prompt,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Creates an upload entry for a user supplied image.
    pub fn upload(file: ImageFile) -> Self {
        Self::new(EntryContent::Binary(file), EntryKind::Upload, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source_classifies_data_urls() {
        let content = EntryContent::from_source("data:image/png;base64,AAAA");
        assert!(matches!(content, EntryContent::LegacyEncoded(_)));

        let content = EntryContent::from_source("https://cdn.example.com/a.png");
        assert_eq!(
            content,
            EntryContent::RemoteUrl("https://cdn.example.com/a.png".to_string())
        );
    }

    #[test]
    fn test_legacy_default_kind() {
        assert_eq!(EntryKind::legacy_default(0), EntryKind::Upload);
        assert_eq!(EntryKind::legacy_default(3), EntryKind::Edit);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntryKind::Transformation).unwrap();
        assert_eq!(json, "\"transformation\"");
    }

    #[test]
    fn test_placeholder_detection() {
        let content = EntryContent::Binary(ImageFile::placeholder("x.png", "image/png"));
        assert!(content.is_placeholder());
        assert!(!EntryContent::RemoteUrl("https://x".into()).is_placeholder());
    }
}
