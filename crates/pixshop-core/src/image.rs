//! Binary image handles.

/// MIME type assumed when an image header cannot be parsed.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// An in-memory image file: the binary payload plus the metadata a browser
/// `File` would carry.
///
/// Handles are owned values; dropping the last clone releases the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// File name shown to the user and used on export.
    pub name: String,
    /// MIME type of the payload (e.g. `image/png`).
    pub mime_type: String,
    /// Last modification time in milliseconds since the UNIX epoch.
    pub last_modified_at: i64,
    /// Raw encoded image bytes.
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Creates a new image handle.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified_at: i64,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified_at,
            bytes,
        }
    }

    /// Creates an empty placeholder handle.
    ///
    /// Used when a stored entry cannot be reconstructed so that the slot in
    /// the timeline is kept.
    pub fn placeholder(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified_at: 0,
            bytes: Vec::new(),
        }
    }

    /// Returns true if the handle carries no image data.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_empty() {
        let file = ImageFile::placeholder("broken.png", DEFAULT_IMAGE_MIME);
        assert!(file.is_empty());
        assert_eq!(file.len(), 0);
        assert_eq!(file.name, "broken.png");
    }

    #[test]
    fn test_new_keeps_metadata() {
        let file = ImageFile::new("cat.jpg", "image/jpeg", 1_700_000_000_000, vec![1, 2, 3]);
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.last_modified_at, 1_700_000_000_000);
        assert_eq!(file.len(), 3);
    }
}
