//! Infrastructure layer for Pixshop.
//!
//! Implements the storage traits from `pixshop-core` on the local file
//! system, plus the binary codec and entry serializer used by the session
//! manager.

pub mod codec;
pub mod config_service;
pub mod dto;
pub mod entry_serializer;
pub mod file_session_store;
pub mod paths;
pub mod settings_repository;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::file_session_store::FileSessionStore;
pub use crate::settings_repository::FileSettingsRepository;
