//! Domain layer for Pixshop.
//!
//! Holds the edit history model, the persisted session record, application
//! settings and configuration, and the traits implemented by the
//! infrastructure layer (`SessionStore`, `SettingsRepository`) and by the
//! generation client (`GenerationService`).

pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod image;
pub mod session;
pub mod settings;

// Re-export common error type
pub use error::{PixshopError, Result};
