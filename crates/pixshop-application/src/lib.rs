//! Application layer for Pixshop.
//!
//! Coordinates the domain timeline with the session store and the
//! generation service.

pub mod editor_session;
pub mod session;

pub use editor_session::EditorSession;
pub use session::SessionManager;
