//! Session record DTOs and migrations.
//!
//! ## Version History
//! - **1.0.0**: Record written by the browser build. No `version` key, every
//!   image stored as base64 text in `data` (or a URL with `isUrl`), cursor
//!   in `historyIndex`.
//! - **2.0.0**: Binary payloads stored as `{"$binary": "<base64>"}`, remote
//!   URLs as plain text; entries carry id, kind, prompt and creation time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use pixshop_core::history::EntryKind;
use pixshop_core::session::{EntryPayload, SerializedEntry, SessionFlags, StoredSession};

/// Entity name used with the migrator.
pub const SESSION_RECORD_ENTITY: &str = "session_record";

/// Version assumed for records saved without a `version` key.
pub const LEGACY_RECORD_VERSION: &str = "1.0.0";

// ============================================================================
// V1.0.0 (legacy)
// ============================================================================

/// Legacy history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEntryV1_0_0 {
    #[serde(default)]
    pub name: String,
    /// MIME type of the original file.
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified: i64,
    /// Base64 image data (optionally with a data-URL header) or a URL.
    /// Anything other than a string reads as empty.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub data: String,
    #[serde(default)]
    pub is_url: bool,
}

/// Legacy session record V1.0.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionRecordV1_0_0 {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub history: Vec<LegacyEntryV1_0_0>,
    #[serde(default = "default_cursor")]
    pub history_index: i64,
    #[serde(default)]
    pub active_tab: Option<String>,
    #[serde(default)]
    pub saved_at: i64,
    #[serde(default)]
    pub flags: SessionFlags,
}

fn default_cursor() -> i64 {
    -1
}

/// Reads a list entry by entry. An element that does not fit `T` becomes
/// `T::default()`, so one damaged entry keeps its slot instead of failing
/// the whole record.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values = Option::<Vec<JsonValue>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(index, error = %e, "Unreadable stored entry, keeping an empty slot");
                T::default()
            })
        })
        .collect())
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(text) => text,
        _ => String::new(),
    })
}

fn lenient_payload<'de, D>(deserializer: D) -> Result<PayloadDto, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Unknown kinds read as `None`; the record conversion fills in the
/// positional default.
fn lenient_kind<'de, D>(deserializer: D) -> Result<Option<EntryKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// ============================================================================
// V2.0.0
// ============================================================================

/// On-disk payload. The shape decides the variant: an object is binary
/// data, a bare string is a URL or legacy base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadDto {
    Binary {
        #[serde(rename = "$binary")]
        data: String,
    },
    Text(String),
}

impl Default for PayloadDto {
    fn default() -> Self {
        PayloadDto::Text(String::new())
    }
}

impl From<EntryPayload> for PayloadDto {
    fn from(payload: EntryPayload) -> Self {
        match payload {
            EntryPayload::Binary(bytes) => PayloadDto::Binary {
                data: BASE64_STANDARD.encode(bytes),
            },
            EntryPayload::Text(text) => PayloadDto::Text(text),
        }
    }
}

impl From<PayloadDto> for EntryPayload {
    fn from(dto: PayloadDto) -> Self {
        match dto {
            // Damaged blobs fall through to the legacy text path, which
            // restores them as placeholders.
            PayloadDto::Binary { data } => match BASE64_STANDARD.decode(data.as_bytes()) {
                Ok(bytes) => EntryPayload::Binary(bytes),
                Err(_) => EntryPayload::Text(data),
            },
            PayloadDto::Text(text) => EntryPayload::Text(text),
        }
    }
}

/// Serialized history entry V2.0.0.
///
/// Every field has a default so that a damaged entry still reads and is
/// restored as a placeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedEntryV2_0_0 {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified_at: i64,
    #[serde(default, deserialize_with = "lenient_payload")]
    pub payload: PayloadDto,
    #[serde(default)]
    pub is_remote_url: bool,
    #[serde(default, deserialize_with = "lenient_kind", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl SerializedEntryV2_0_0 {
    /// Converts to the domain form. A missing id gets a fresh one and a
    /// missing or unknown kind gets the default for `index`.
    fn into_serialized(self, index: usize) -> SerializedEntry {
        let id = if self.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            self.id
        };
        SerializedEntry {
            id,
            name: self.name,
            mime_type: self.mime_type,
            last_modified_at: self.last_modified_at,
            payload: self.payload.into(),
            is_remote_url: self.is_remote_url,
            kind: self
                .kind
                .unwrap_or_else(|| EntryKind::legacy_default(index)),
            prompt: self.prompt,
            created_at: self.created_at,
        }
    }
}

/// Session record V2.0.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionRecordV2_0_0 {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub entries: Vec<SerializedEntryV2_0_0>,
    #[serde(default = "default_cursor")]
    pub cursor: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab_id: Option<String>,
    #[serde(default)]
    pub flags: SessionFlags,
    #[serde(default)]
    pub saved_at: i64,
}

/// Type alias for the latest session record version.
pub type SessionRecordDTO = SessionRecordV2_0_0;

// ============================================================================
// Migration implementations
// ============================================================================

fn is_http_url(data: &str) -> bool {
    let lower = data.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Migration from SessionRecordV1_0_0 to SessionRecordV2_0_0.
///
/// Payloads stay text; the entry serializer decodes them on load. Entries
/// get fresh ids, the legacy default kind for their position and creation
/// times counted up from the save time.
impl MigratesTo<SessionRecordV2_0_0> for SessionRecordV1_0_0 {
    fn migrate(self) -> SessionRecordV2_0_0 {
        let saved_at = self.saved_at;
        let entries = self
            .history
            .into_iter()
            .enumerate()
            .map(|(index, legacy)| {
                let is_remote_url = legacy.is_url || is_http_url(&legacy.data);
                SerializedEntryV2_0_0 {
                    id: Uuid::new_v4().to_string(),
                    name: legacy.name,
                    mime_type: legacy.mime_type,
                    last_modified_at: legacy.last_modified,
                    payload: PayloadDto::Text(legacy.data),
                    is_remote_url,
                    kind: Some(EntryKind::legacy_default(index)),
                    prompt: None,
                    created_at: saved_at.saturating_add(index as i64),
                }
            })
            .collect();

        SessionRecordV2_0_0 {
            entries,
            cursor: self.history_index,
            active_tab_id: self.active_tab,
            flags: self.flags,
            saved_at,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<SerializedEntry> for SerializedEntryV2_0_0 {
    fn from(entry: SerializedEntry) -> Self {
        SerializedEntryV2_0_0 {
            id: entry.id,
            name: entry.name,
            mime_type: entry.mime_type,
            last_modified_at: entry.last_modified_at,
            payload: entry.payload.into(),
            is_remote_url: entry.is_remote_url,
            kind: Some(entry.kind),
            prompt: entry.prompt,
            created_at: entry.created_at,
        }
    }
}

/// Convert SessionRecordV2_0_0 DTO to domain model.
impl IntoDomain<StoredSession> for SessionRecordV2_0_0 {
    fn into_domain(self) -> StoredSession {
        StoredSession {
            entries: self
                .entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| entry.into_serialized(index))
                .collect(),
            cursor: self.cursor,
            active_tab_id: self.active_tab_id,
            flags: self.flags,
            saved_at: self.saved_at,
        }
    }
}

/// Convert domain model to SessionRecordV2_0_0 DTO for persistence.
impl FromDomain<StoredSession> for SessionRecordV2_0_0 {
    fn from_domain(record: StoredSession) -> Self {
        SessionRecordV2_0_0 {
            entries: record.entries.into_iter().map(Into::into).collect(),
            cursor: record.cursor,
            active_tab_id: record.active_tab_id,
            flags: record.flags,
            saved_at: record.saved_at,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for session records.
///
/// # Migration Path
///
/// - V1.0.0 → V2.0.0: Base64 text payloads kept as text, ids, kinds and
///   creation times assigned
/// - V2.0.0 → StoredSession: Binary blobs decoded
///
/// # Example
///
/// ```ignore
/// let migrator = create_session_record_migrator();
/// let record: StoredSession = migrator.load_flat_from("session_record", json_value)?;
/// ```
pub fn create_session_record_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let path = version_migrate::Migrator::define(SESSION_RECORD_ENTITY)
        .from::<SessionRecordV1_0_0>()
        .step::<SessionRecordV2_0_0>()
        .into_with_save::<StoredSession>();

    migrator
        .register(path)
        .expect("Failed to register session_record migration path");

    migrator
}

/// Tags an unversioned record as the legacy version so the migrator can
/// pick the right starting point.
pub fn ensure_version_tag(value: &mut serde_json::Value) {
    if let Some(object) = value.as_object_mut() {
        object
            .entry("version")
            .or_insert_with(|| serde_json::Value::String(LEGACY_RECORD_VERSION.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape_dispatch() {
        let binary: PayloadDto = serde_json::from_value(json!({"$binary": "aGk="})).unwrap();
        assert_eq!(EntryPayload::from(binary), EntryPayload::Binary(b"hi".to_vec()));

        let text: PayloadDto = serde_json::from_value(json!("https://x/y.png")).unwrap();
        assert_eq!(
            EntryPayload::from(text),
            EntryPayload::Text("https://x/y.png".to_string())
        );
    }

    #[test]
    fn test_damaged_blob_degrades_to_text() {
        let dto = PayloadDto::Binary {
            data: "***".to_string(),
        };
        assert!(matches!(EntryPayload::from(dto), EntryPayload::Text(_)));
    }

    #[test]
    fn test_binary_payload_serializes_as_object() {
        let dto = PayloadDto::from(EntryPayload::Binary(vec![1, 2]));
        assert_eq!(serde_json::to_value(dto).unwrap(), json!({"$binary": "AQI="}));
    }

    #[test]
    fn test_migrate_v1_to_v2() {
        let v1: SessionRecordV1_0_0 = serde_json::from_value(json!({
            "history": [
                {"name": "a.png", "type": "image/png", "lastModified": 5, "data": "aGk="},
                {"name": "b", "type": "", "lastModified": 6, "data": "https://cdn/b.png"},
                {"name": "c", "type": "", "lastModified": 7, "data": "blob-ref", "isUrl": true}
            ],
            "historyIndex": 2,
            "activeTab": "retouch",
            "savedAt": 1000
        }))
        .unwrap();

        let v2 = v1.migrate();
        assert_eq!(v2.cursor, 2);
        assert_eq!(v2.active_tab_id.as_deref(), Some("retouch"));
        assert_eq!(v2.entries.len(), 3);
        assert_eq!(v2.entries[0].kind, Some(EntryKind::Upload));
        assert_eq!(v2.entries[1].kind, Some(EntryKind::Edit));
        assert!(!v2.entries[0].is_remote_url);
        assert!(v2.entries[1].is_remote_url);
        assert!(v2.entries[2].is_remote_url);
        assert_eq!(v2.entries[0].payload, PayloadDto::Text("aGk=".to_string()));
        assert_eq!(v2.entries[2].created_at, 1002);
    }

    #[test]
    fn test_damaged_legacy_entry_keeps_its_slot() {
        let v1: SessionRecordV1_0_0 = serde_json::from_value(json!({
            "history": [
                {"name": "a.png", "type": "image/png", "data": "aGk="},
                {"name": "b.png", "type": "image/png", "data": null},
                {"name": "c.png", "type": "image/png"},
                42,
                {"name": "e.png", "type": "image/png", "data": "aGk="}
            ],
            "historyIndex": 4,
            "savedAt": i64::MAX
        }))
        .unwrap();

        let v2 = v1.migrate();
        assert_eq!(v2.entries.len(), 5);
        assert_eq!(v2.entries[1].payload, PayloadDto::Text(String::new()));
        assert_eq!(v2.entries[1].name, "b.png");
        assert_eq!(v2.entries[2].payload, PayloadDto::Text(String::new()));
        assert_eq!(v2.entries[3].payload, PayloadDto::Text(String::new()));
        assert_eq!(v2.entries[4].payload, PayloadDto::Text("aGk=".to_string()));
        assert_eq!(v2.entries[4].created_at, i64::MAX);
    }

    #[test]
    fn test_damaged_current_entries_keep_their_slots() {
        let migrator = create_session_record_migrator();
        let value = json!({
            "version": "2.0.0",
            "entries": [
                {"id": "e0", "name": "a.png", "mimeType": "image/png", "lastModifiedAt": 1,
                 "payload": {"$binary": "aGk="}, "kind": "upload", "createdAt": 1},
                {"id": "e1", "name": "b.png", "mimeType": "image/png", "lastModifiedAt": 2,
                 "payload": {"$binary": "aGk="}, "kind": "retouch", "createdAt": 2},
                {"payload": 7},
                null
            ],
            "cursor": 1,
            "savedAt": 10
        });

        let record: StoredSession = migrator
            .load_flat_from(SESSION_RECORD_ENTITY, value)
            .unwrap();
        assert_eq!(record.entries.len(), 4);
        assert_eq!(record.entries[0].kind, EntryKind::Upload);
        assert_eq!(record.entries[1].kind, EntryKind::Edit);
        assert_eq!(record.entries[1].payload, EntryPayload::Binary(b"hi".to_vec()));
        assert_eq!(record.entries[2].payload, EntryPayload::Text(String::new()));
        assert!(!record.entries[2].id.is_empty());
        assert_eq!(record.entries[3].kind, EntryKind::Edit);
        assert_ne!(record.entries[2].id, record.entries[3].id);
    }

    #[test]
    fn test_ensure_version_tag() {
        let mut unversioned = json!({"history": []});
        ensure_version_tag(&mut unversioned);
        assert_eq!(unversioned["version"], "1.0.0");

        let mut versioned = json!({"version": "2.0.0"});
        ensure_version_tag(&mut versioned);
        assert_eq!(versioned["version"], "2.0.0");
    }

    #[test]
    fn test_migrator_loads_both_versions() {
        let migrator = create_session_record_migrator();

        let legacy = json!({
            "version": "1.0.0",
            "history": [{"name": "a.png", "type": "image/png", "data": "aGk="}],
            "historyIndex": 0,
            "savedAt": 10
        });
        let record: StoredSession = migrator
            .load_flat_from(SESSION_RECORD_ENTITY, legacy)
            .unwrap();
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.entries[0].payload, EntryPayload::Text("aGk=".to_string()));

        let current = json!({
            "version": "2.0.0",
            "entries": [{
                "id": "e1",
                "name": "a.png",
                "mimeType": "image/png",
                "lastModifiedAt": 1,
                "payload": {"$binary": "aGk="},
                "isRemoteUrl": false,
                "kind": "generation",
                "prompt": "sunset",
                "createdAt": 2
            }],
            "cursor": 0,
            "savedAt": 10
        });
        let record: StoredSession = migrator
            .load_flat_from(SESSION_RECORD_ENTITY, current)
            .unwrap();
        assert_eq!(record.entries[0].payload, EntryPayload::Binary(b"hi".to_vec()));
        assert_eq!(record.entries[0].kind, EntryKind::Generation);
        assert_eq!(record.cursor, 0);
    }
}
