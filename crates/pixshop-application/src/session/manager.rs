use chrono::Utc;
use pixshop_core::error::Result;
use pixshop_core::history::HistoryEntry;
use pixshop_core::session::{
    DestroyOutcome, PersistOutcome, SessionFlags, SessionSnapshot, SessionState, SessionStore,
    StoredSession,
};
use pixshop_infrastructure::entry_serializer::{deserialize_entries, serialize_entries};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Facade over the session store.
///
/// `SessionManager` is responsible for:
/// - Saving the whole timeline as one record
/// - Restoring it on startup
/// - Clearing the record and resetting the whole store
///
/// None of its operations fail the caller. Store errors are logged and
/// folded into a [`PersistOutcome`] (or `None` on load); the in-memory
/// timeline stays authoritative.
pub struct SessionManager {
    /// Persistent storage backend for the session record
    store: Arc<dyn SessionStore>,
    /// Last known state of the persisted session
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Creates a new `SessionManager` over a store backend.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::Empty),
        }
    }

    /// Returns the last known state of the persisted session.
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Replaces the persisted session with the given timeline.
    ///
    /// # Arguments
    ///
    /// * `entries` - The full timeline, oldest first
    /// * `cursor` - Index of the current entry, `None` when empty
    /// * `active_tab_id` - Tool tab the user was on
    /// * `flags` - Free-form flags restored with the session
    pub async fn save_session(
        &self,
        entries: &[HistoryEntry],
        cursor: Option<usize>,
        active_tab_id: Option<&str>,
        flags: &SessionFlags,
    ) -> PersistOutcome {
        let record = StoredSession {
            entries: serialize_entries(entries),
            cursor: persisted_cursor(cursor, entries.len()),
            active_tab_id: active_tab_id.map(str::to_string),
            flags: flags.clone(),
            saved_at: Utc::now().timestamp_millis(),
        };

        match self.try_write(&record).await {
            Ok(()) => {
                debug!(entries = entries.len(), cursor = record.cursor, "Session saved");
                *self.state.write().await = if entries.is_empty() {
                    SessionState::Empty
                } else {
                    SessionState::Active
                };
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(error = %e, "Failed to save session; keeping in-memory history");
                PersistOutcome::Skipped
            }
        }
    }

    /// Loads the persisted session.
    ///
    /// # Returns
    ///
    /// `Some(snapshot)` when a record exists, `None` when there is none or
    /// the store could not be read. Undecodable entries come back as
    /// placeholders and the cursor is clamped into range.
    pub async fn load_session(&self) -> Option<SessionSnapshot> {
        let record = match self.try_read().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("No persisted session");
                *self.state.write().await = SessionState::Empty;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load session; starting empty");
                return None;
            }
        };

        let raw_cursor = record.cursor;
        let entries = deserialize_entries(record.entries);
        let cursor = restored_cursor(raw_cursor, entries.len());
        if cursor.map_or(-1, |c| c as i64) != raw_cursor {
            warn!(stored = raw_cursor, len = entries.len(), ?cursor, "Clamped stored cursor");
        }

        let snapshot = SessionSnapshot {
            entries,
            cursor,
            active_tab_id: record.active_tab_id,
            flags: record.flags,
        };
        *self.state.write().await = snapshot.state();
        info!(entries = snapshot.entries.len(), ?cursor, "Session restored");
        Some(snapshot)
    }

    /// Removes the persisted record, keeping the store.
    ///
    /// Clearing an already empty store succeeds.
    pub async fn clear_session(&self) -> PersistOutcome {
        match self.try_clear().await {
            Ok(()) => {
                info!("Session cleared");
                *self.state.write().await = SessionState::Cleared;
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear session");
                PersistOutcome::Skipped
            }
        }
    }

    /// Destroys the whole store. The next operation recreates it.
    pub async fn reset_everything(&self) -> PersistOutcome {
        match self.store.destroy_all().await {
            Ok(outcome) => {
                match outcome {
                    DestroyOutcome::Destroyed => info!("Session store destroyed"),
                    DestroyOutcome::NotPresent => debug!("No session store to destroy"),
                    DestroyOutcome::Blocked => {
                        warn!("Session store was in use elsewhere while being destroyed")
                    }
                }
                *self.state.write().await = SessionState::Empty;
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(error = %e, "Failed to reset session store");
                PersistOutcome::Skipped
            }
        }
    }

    async fn try_write(&self, record: &StoredSession) -> Result<()> {
        self.store.open().await?;
        self.store.write(record).await
    }

    async fn try_read(&self) -> Result<Option<StoredSession>> {
        self.store.open().await?;
        self.store.read().await
    }

    async fn try_clear(&self) -> Result<()> {
        self.store.open().await?;
        self.store.delete_record().await
    }
}

/// Cursor as stored: `-1` when empty, otherwise within the entries.
fn persisted_cursor(cursor: Option<usize>, len: usize) -> i64 {
    match (len, cursor) {
        (0, _) => -1,
        (len, Some(index)) => index.min(len - 1) as i64,
        (len, None) => (len - 1) as i64,
    }
}

/// Clamps a stored cursor to `[-1, len - 1]`. A non-empty timeline always
/// gets a position; out-of-range values land on the nearest end.
fn restored_cursor(raw: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    match usize::try_from(raw) {
        Ok(index) => Some(index.min(last)),
        Err(_) if raw == -1 => Some(last),
        Err(_) => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_cursor() {
        assert_eq!(persisted_cursor(None, 0), -1);
        assert_eq!(persisted_cursor(Some(4), 0), -1);
        assert_eq!(persisted_cursor(Some(1), 3), 1);
        assert_eq!(persisted_cursor(Some(9), 3), 2);
        assert_eq!(persisted_cursor(None, 3), 2);
    }

    #[test]
    fn test_restored_cursor_clamps() {
        assert_eq!(restored_cursor(-1, 0), None);
        assert_eq!(restored_cursor(5, 0), None);
        assert_eq!(restored_cursor(1, 3), Some(1));
        assert_eq!(restored_cursor(7, 3), Some(2));
        assert_eq!(restored_cursor(-1, 3), Some(2));
        assert_eq!(restored_cursor(-9, 3), Some(0));
    }
}
