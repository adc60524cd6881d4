//! Edit history domain module.
//!
//! - `model`: entries and their content (`HistoryEntry`, `EntryContent`, `EntryKind`)
//! - `timeline`: the undo/redo ledger (`Timeline`)

mod model;
mod timeline;

pub use model::{DATA_URL_PREFIX, EntryContent, EntryKind, HistoryEntry};
pub use timeline::Timeline;
