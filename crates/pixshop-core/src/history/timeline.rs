use super::model::HistoryEntry;

/// The linear undo/redo ledger of a session.
///
/// Entries form a single sequence and `cursor` marks the entry being viewed.
/// Undo and redo only move the cursor. Pushing a new entry while the cursor
/// is not at the end discards every entry after the cursor first, so redo
/// history is lost on a new edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<HistoryEntry>,
    /// `None` means the timeline is empty (persisted as `-1`).
    cursor: Option<usize>,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a timeline from restored parts.
    ///
    /// An out-of-range cursor is clamped to the last entry; a missing cursor
    /// on a non-empty list points at the last entry.
    pub fn from_parts(entries: Vec<HistoryEntry>, cursor: Option<usize>) -> Self {
        let cursor = match (entries.len(), cursor) {
            (0, _) => None,
            (len, Some(index)) => Some(index.min(len - 1)),
            (len, None) => Some(len - 1),
        };
        Self { entries, cursor }
    }

    /// Appends a new entry after the cursor and makes it current.
    pub fn push(&mut self, entry: HistoryEntry) {
        let keep = self.cursor.map_or(0, |index| index + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Moves the cursor one step back. Returns false if already at the start.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(index) if index > 0 => {
                self.cursor = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Moves the cursor one step forward. Returns false if already at the end.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(index) if index + 1 < self.entries.len() => {
                self.cursor = Some(index + 1);
                true
            }
            _ => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(index) if index + 1 < self.entries.len())
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    /// The first entry of the session (the original upload).
    pub fn original(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor in its persisted form, where `-1` marks an empty timeline.
    pub fn cursor_index(&self) -> i64 {
        self.cursor.map_or(-1, |index| index as i64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry and resets the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{EntryContent, EntryKind};

    fn entry(label: &str) -> HistoryEntry {
        HistoryEntry::new(
            EntryContent::RemoteUrl(format!("https://img.example.com/{label}.png")),
            EntryKind::Edit,
            Some(label.to_string()),
        )
    }

    fn labels(timeline: &Timeline) -> Vec<String> {
        timeline
            .entries()
            .iter()
            .map(|e| e.prompt.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_new_timeline_is_empty() {
        let timeline = Timeline::new();
        assert!(timeline.is_empty());
        assert_eq!(timeline.cursor(), None);
        assert_eq!(timeline.cursor_index(), -1);
        assert!(timeline.current().is_none());
    }

    #[test]
    fn test_push_moves_cursor_to_end() {
        let mut timeline = Timeline::new();
        timeline.push(entry("e0"));
        timeline.push(entry("e1"));
        assert_eq!(timeline.cursor(), Some(1));
        assert_eq!(timeline.current().unwrap().prompt.as_deref(), Some("e1"));
    }

    #[test]
    fn test_push_after_undo_truncates_redo_history() {
        let mut timeline = Timeline::new();
        timeline.push(entry("e0"));
        timeline.push(entry("e1"));
        timeline.push(entry("e2"));

        assert!(timeline.undo());
        assert!(timeline.undo());
        assert_eq!(timeline.cursor(), Some(0));

        timeline.push(entry("new"));
        assert_eq!(labels(&timeline), vec!["e0", "new"]);
        assert_eq!(timeline.cursor(), Some(1));
        assert!(!timeline.can_redo());
    }

    #[test]
    fn test_undo_redo_bounds() {
        let mut timeline = Timeline::new();
        assert!(!timeline.undo());
        assert!(!timeline.redo());
        assert_eq!(timeline.cursor_index(), -1);

        timeline.push(entry("e0"));
        timeline.push(entry("e1"));

        assert!(!timeline.redo());
        assert_eq!(timeline.cursor(), Some(1));

        assert!(timeline.undo());
        assert!(!timeline.undo());
        assert_eq!(timeline.cursor(), Some(0));

        assert!(timeline.redo());
        assert_eq!(timeline.cursor(), Some(1));
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_from_parts_clamps_cursor() {
        let timeline = Timeline::from_parts(vec![entry("a"), entry("b")], Some(7));
        assert_eq!(timeline.cursor(), Some(1));

        let timeline = Timeline::from_parts(vec![entry("a")], None);
        assert_eq!(timeline.cursor(), Some(0));

        let timeline = Timeline::from_parts(Vec::new(), Some(3));
        assert_eq!(timeline.cursor(), None);
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut timeline = Timeline::new();
        timeline.push(entry("a"));
        timeline.clear();
        assert!(timeline.is_empty());
        assert_eq!(timeline.cursor(), None);
    }
}
