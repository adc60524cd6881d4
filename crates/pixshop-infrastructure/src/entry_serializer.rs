//! Conversion between history entries and their storable form.
//!
//! Serialization always produces the current representation: binary content
//! and legacy data strings become a binary payload, remote URLs stay text.
//! Deserialization also accepts the legacy shape, where binary content was
//! stored as base64 text, and never fails: an entry that cannot be decoded
//! is restored as an empty placeholder so that indices stay aligned.

use tracing::{debug, warn};

use pixshop_core::PixshopError;
use pixshop_core::history::{EntryContent, HistoryEntry};
use pixshop_core::image::{DEFAULT_IMAGE_MIME, ImageFile};
use pixshop_core::session::{EntryPayload, REMOTE_URL_MIME, REMOTE_URL_NAME, SerializedEntry};

use crate::codec::{decode_base64_lenient, decode_data_url, mime_for_name, sniff_mime};

/// A reconstructed entry plus the problem met while decoding it, if any.
#[derive(Debug, Clone)]
pub struct RestoredEntry {
    pub entry: HistoryEntry,
    /// Set when the entry was replaced by a placeholder.
    pub issue: Option<PixshopError>,
}

impl RestoredEntry {
    pub fn is_degraded(&self) -> bool {
        self.issue.is_some()
    }
}

/// Converts a history entry into its storable form.
pub fn serialize_entry(entry: &HistoryEntry) -> SerializedEntry {
    let (name, mime_type, last_modified_at, payload, is_remote_url) = match &entry.content {
        EntryContent::RemoteUrl(url) => (
            REMOTE_URL_NAME.to_string(),
            REMOTE_URL_MIME.to_string(),
            entry.created_at,
            EntryPayload::Text(url.clone()),
            true,
        ),
        EntryContent::Binary(file) => (
            file.name.clone(),
            file.mime_type.clone(),
            file.last_modified_at,
            EntryPayload::Binary(file.bytes.clone()),
            false,
        ),
        EntryContent::LegacyEncoded(source) => match decode_data_url(source) {
            Ok(decoded) => (
                derived_name(entry, &decoded.mime_type),
                decoded.mime_type,
                entry.created_at,
                EntryPayload::Binary(decoded.bytes),
                false,
            ),
            Err(e) => {
                // Kept as text so the legacy path can retry on the next load.
                warn!(entry_id = %entry.id, error = %e, "Storing undecodable data string as text");
                (
                    derived_name(entry, DEFAULT_IMAGE_MIME),
                    DEFAULT_IMAGE_MIME.to_string(),
                    entry.created_at,
                    EntryPayload::Text(source.clone()),
                    false,
                )
            }
        },
    };

    SerializedEntry {
        id: entry.id.clone(),
        name,
        mime_type,
        last_modified_at,
        payload,
        is_remote_url,
        kind: entry.kind,
        prompt: entry.prompt.clone(),
        created_at: entry.created_at,
    }
}

/// Serializes a timeline, preserving order.
pub fn serialize_entries(entries: &[HistoryEntry]) -> Vec<SerializedEntry> {
    entries.iter().map(serialize_entry).collect()
}

/// Reconstructs the entry stored at `index`.
pub fn deserialize_entry(index: usize, serialized: SerializedEntry) -> RestoredEntry {
    let SerializedEntry {
        id,
        name,
        mime_type,
        last_modified_at,
        payload,
        is_remote_url,
        kind,
        prompt,
        created_at,
    } = serialized;

    let (content, issue) = match (is_remote_url, payload) {
        (true, EntryPayload::Text(url)) => (EntryContent::RemoteUrl(url), None),
        (true, EntryPayload::Binary(bytes)) => (
            EntryContent::RemoteUrl(String::from_utf8_lossy(&bytes).into_owned()),
            None,
        ),
        (false, EntryPayload::Binary(bytes)) => {
            let mime_type = resolve_mime(&mime_type, &name, &bytes);
            (
                EntryContent::Binary(ImageFile::new(name, mime_type, last_modified_at, bytes)),
                None,
            )
        }
        (false, EntryPayload::Text(text)) => {
            match decode_legacy(index, &text, &mime_type, &name) {
                Ok((bytes, mime_type)) => (
                    EntryContent::Binary(ImageFile::new(name, mime_type, last_modified_at, bytes)),
                    None,
                ),
                Err(e) => {
                    let mime_type = resolve_mime(&mime_type, &name, &[]);
                    (
                        EntryContent::Binary(ImageFile::placeholder(name, mime_type)),
                        Some(e),
                    )
                }
            }
        }
    };

    RestoredEntry {
        entry: HistoryEntry {
            id,
            content,
            kind,
            prompt,
            created_at,
        },
        issue,
    }
}

/// Reconstructs a whole timeline.
///
/// The output has exactly one entry per input, in the same order. Entries
/// that could not be decoded are logged and kept as placeholders.
pub fn deserialize_entries(serialized: Vec<SerializedEntry>) -> Vec<HistoryEntry> {
    let total = serialized.len();
    let entries: Vec<HistoryEntry> = serialized
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let restored = deserialize_entry(index, entry);
            if let Some(issue) = &restored.issue {
                warn!(index, error = %issue, "Restoring entry as placeholder");
            }
            restored.entry
        })
        .collect();
    debug!(total, "Deserialized history entries");
    entries
}

fn decode_legacy(
    index: usize,
    text: &str,
    stored_mime: &str,
    name: &str,
) -> Result<(Vec<u8>, String), PixshopError> {
    let (bytes, header_mime) = if text.trim_start().starts_with("data:") {
        let decoded =
            decode_data_url(text).map_err(|e| PixshopError::legacy_decode(index, e.to_string()))?;
        (decoded.bytes, Some(decoded.mime_type))
    } else {
        let bytes =
            decode_base64_lenient(text).map_err(|e| PixshopError::legacy_decode(index, e.to_string()))?;
        (bytes, None)
    };

    if bytes.is_empty() {
        return Err(PixshopError::legacy_decode(index, "payload decoded to zero bytes"));
    }

    let mime_type = match header_mime {
        Some(mime) if stored_mime.trim().is_empty() => mime,
        _ => resolve_mime(stored_mime, name, &bytes),
    };
    Ok((bytes, mime_type))
}

/// Stored MIME first, then magic bytes, then the file extension.
fn resolve_mime(stored: &str, name: &str, bytes: &[u8]) -> String {
    let stored = stored.trim();
    if !stored.is_empty() && stored != REMOTE_URL_MIME {
        return stored.to_string();
    }
    sniff_mime(bytes)
        .map(str::to_string)
        .or_else(|| mime_for_name(name))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

fn derived_name(entry: &HistoryEntry, mime_type: &str) -> String {
    let extension = mime_guess::get_mime_extensions_str(mime_type)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("png");
    format!("{}-{}.{extension}", entry.kind, short_id(&entry.id))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use pixshop_core::history::EntryKind;

    fn binary_entry(bytes: &[u8]) -> HistoryEntry {
        HistoryEntry::upload(ImageFile::new("cat.png", "image/png", 1_700_000, bytes.to_vec()))
    }

    fn legacy_serialized(text: &str) -> SerializedEntry {
        SerializedEntry {
            id: "legacy".to_string(),
            name: "old.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            last_modified_at: 42,
            payload: EntryPayload::Text(text.to_string()),
            is_remote_url: false,
            kind: EntryKind::Edit,
            prompt: None,
            created_at: 42,
        }
    }

    #[test]
    fn test_binary_entry_round_trip() {
        let entry = binary_entry(&[1, 2, 3]);
        let serialized = serialize_entry(&entry);
        assert!(!serialized.is_remote_url);
        assert_eq!(serialized.payload, EntryPayload::Binary(vec![1, 2, 3]));

        let restored = deserialize_entry(0, serialized);
        assert!(!restored.is_degraded());
        assert_eq!(restored.entry, entry);
    }

    #[test]
    fn test_remote_url_round_trip() {
        let entry = HistoryEntry::new(
            EntryContent::RemoteUrl("https://cdn.example.com/a.png".to_string()),
            EntryKind::Generation,
            Some("a red fox".to_string()),
        );
        let serialized = serialize_entry(&entry);
        assert!(serialized.is_remote_url);
        assert_eq!(serialized.name, REMOTE_URL_NAME);
        assert_eq!(serialized.mime_type, REMOTE_URL_MIME);

        let restored = deserialize_entry(0, serialized);
        assert_eq!(restored.entry, entry);
    }

    #[test]
    fn test_legacy_data_string_is_stored_as_binary() {
        let entry = HistoryEntry::new(
            EntryContent::LegacyEncoded("data:image/webp;base64,aGk=".to_string()),
            EntryKind::Edit,
            None,
        );
        let serialized = serialize_entry(&entry);
        assert_eq!(serialized.payload, EntryPayload::Binary(b"hi".to_vec()));
        assert_eq!(serialized.mime_type, "image/webp");
        assert!(serialized.name.starts_with("edit-"));

        let restored = deserialize_entry(0, serialized).entry;
        let file = restored.content.as_binary().unwrap();
        assert_eq!(file.bytes, b"hi");
        assert_eq!(restored.kind, EntryKind::Edit);
    }

    #[test]
    fn test_legacy_base64_text_is_decoded() {
        let text = STANDARD.encode([9u8, 8, 7]);
        let restored = deserialize_entry(1, legacy_serialized(&text));
        assert!(!restored.is_degraded());
        let file = restored.entry.content.as_binary().unwrap();
        assert_eq!(file.bytes, vec![9, 8, 7]);
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.last_modified_at, 42);
    }

    #[test]
    fn test_legacy_data_url_text_is_decoded() {
        let restored = deserialize_entry(0, legacy_serialized("data:image/gif;base64,aGk="));
        let file = restored.entry.content.as_binary().unwrap();
        assert_eq!(file.bytes, b"hi");
        assert_eq!(file.mime_type, "image/jpeg");
    }

    #[test]
    fn test_corrupt_legacy_entry_becomes_placeholder() {
        let restored = deserialize_entry(3, legacy_serialized("!!!corrupt!!!"));
        assert!(restored.entry.content.is_placeholder());
        match restored.issue {
            Some(PixshopError::LegacyDecode { index, .. }) => assert_eq!(index, 3),
            other => panic!("unexpected issue: {other:?}"),
        }
    }

    #[test]
    fn test_empty_legacy_payload_becomes_placeholder() {
        let restored = deserialize_entry(0, legacy_serialized(""));
        assert!(restored.entry.content.is_placeholder());
        assert!(restored.is_degraded());
    }

    #[test]
    fn test_deserialize_entries_preserves_order_and_count() {
        let entries = vec![binary_entry(&[1]), binary_entry(&[2]), binary_entry(&[3])];
        let mut serialized = serialize_entries(&entries);
        serialized.insert(1, legacy_serialized("@@@"));

        let restored = deserialize_entries(serialized);
        assert_eq!(restored.len(), 4);
        assert_eq!(restored[0], entries[0]);
        assert!(restored[1].content.is_placeholder());
        assert_eq!(restored[2], entries[1]);
        assert_eq!(restored[3], entries[2]);
    }

    #[test]
    fn test_missing_mime_is_resolved() {
        let mut serialized = serialize_entry(&binary_entry(&[0xFF, 0xD8, 0xFF, 0xE0]));
        serialized.mime_type = String::new();
        let restored = deserialize_entry(0, serialized);
        let file = restored.entry.content.as_binary().unwrap();
        assert_eq!(file.mime_type, "image/jpeg");
    }
}
