//! Session persistence facade.

mod manager;

pub use manager::SessionManager;
