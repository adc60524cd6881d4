//! Low-level file storage.

pub mod record_file;

pub use record_file::{FileLock, RecordFile, RecordFileError, RecordFormat};
