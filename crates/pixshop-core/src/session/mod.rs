//! Session persistence domain module.
//!
//! - `model`: the stored record (`StoredSession`, `SerializedEntry`) and the
//!   restored view (`SessionSnapshot`)
//! - `repository`: the backend trait (`SessionStore`)

mod model;
mod repository;

pub use model::{
    CURRENT_RECORD_KEY, DestroyOutcome, EntryPayload, PersistOutcome, REMOTE_URL_MIME,
    REMOTE_URL_NAME, SerializedEntry, SessionFlags, SessionSnapshot, SessionState, StoredSession,
};
pub use repository::SessionStore;
