//! Persisted session record and the snapshot handed back to the UI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::{EntryKind, HistoryEntry};

/// Fixed key of the single logical session record.
pub const CURRENT_RECORD_KEY: &str = "current";

/// Name stored for remote-URL entries.
pub const REMOTE_URL_NAME: &str = "remote-url";

/// MIME type stored for remote-URL entries.
pub const REMOTE_URL_MIME: &str = "application/octet-stream";

/// Free-form feature flags saved alongside a session (theme, tier, toggles).
pub type SessionFlags = BTreeMap<String, serde_json::Value>;

/// Stored payload of a serialized entry.
///
/// `Binary` is the current representation. `Text` holds either a remote URL
/// or, in records written by older builds, base64 image data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryPayload {
    Binary(Vec<u8>),
    Text(String),
}

impl EntryPayload {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

/// Storable form of a [`HistoryEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub last_modified_at: i64,
    pub payload: EntryPayload,
    pub is_remote_url: bool,
    pub kind: EntryKind,
    pub prompt: Option<String>,
    pub created_at: i64,
}

/// The single record that holds a whole session on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub entries: Vec<SerializedEntry>,
    /// Index of the current entry, `-1` when empty.
    pub cursor: i64,
    pub active_tab_id: Option<String>,
    #[serde(default)]
    pub flags: SessionFlags,
    /// Save time in milliseconds since the UNIX epoch.
    pub saved_at: i64,
}

impl StoredSession {
    /// Cursor as an index, or `None` for the empty marker and negative values.
    pub fn cursor_position(&self) -> Option<usize> {
        usize::try_from(self.cursor).ok()
    }
}

/// A restored session, ready to be loaded into a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub entries: Vec<HistoryEntry>,
    pub cursor: Option<usize>,
    pub active_tab_id: Option<String>,
    pub flags: SessionFlags,
}

impl SessionSnapshot {
    /// Current caller-visible state of the restored session.
    pub fn state(&self) -> SessionState {
        if self.entries.is_empty() || self.cursor.is_none() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }
}

/// Caller-visible session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No record, or a record with no entries.
    Empty,
    /// A record with a valid cursor.
    Active,
    /// The record was explicitly removed; the store schema survives.
    Cleared,
}

/// Result of a best-effort persistence call.
///
/// Persistence never fails the caller; the outcome only reports whether the
/// on-disk copy is now in sync with memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    /// The store rejected the operation; the failure was logged.
    Skipped,
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Result of destroying the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The store was removed.
    Destroyed,
    /// There was nothing to remove.
    NotPresent,
    /// Another holder had the store open; removal went ahead regardless.
    Blocked,
}
