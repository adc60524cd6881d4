//! Record file storage with ACID guarantees.
//!
//! A thin layer over one JSON or TOML file. Content is exchanged as
//! `serde_json::Value`, leaving DTOs and migrations to the repository layer.
//!
//! Provides:
//! - **Atomicity**: tmp file + rename, so readers see the old or the new file
//! - **Isolation**: an exclusive `fs2` lock on a sibling `.lock` file
//! - **Durability**: fsync before rename

use serde_json::Value as JsonValue;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::path::{Path, PathBuf};
use thiserror::Error;

use fs2::FileExt;

use pixshop_core::PixshopError;

/// Errors that can occur during record file operations.
#[derive(Debug, Error)]
pub enum RecordFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<RecordFileError> for PixshopError {
    fn from(err: RecordFileError) -> Self {
        match err {
            RecordFileError::Io(e) => e.into(),
            RecordFileError::Json(e) => e.into(),
            RecordFileError::TomlParse(e) => e.into(),
            RecordFileError::TomlSer(e) => e.into(),
            RecordFileError::Lock(message) => PixshopError::io(message),
            RecordFileError::InvalidPath(message) => PixshopError::io(message),
        }
    }
}

/// On-disk format of a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Toml,
}

/// A handle to one atomically replaced file.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    format: RecordFormat,
}

impl RecordFile {
    pub fn new(path: PathBuf, format: RecordFormat) -> Self {
        Self { path, format }
    }

    pub fn json(path: PathBuf) -> Self {
        Self::new(path, RecordFormat::Json)
    }

    pub fn toml(path: PathBuf) -> Self {
        Self::new(path, RecordFormat::Toml)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file guarding this record.
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Loads the file as a JSON value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(JsonValue))`: Successfully loaded
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<JsonValue>, RecordFileError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value = match self.format {
            RecordFormat::Json => serde_json::from_str(&content)?,
            RecordFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(&content)?;
                serde_json::to_value(toml_value)?
            }
        };
        Ok(Some(value))
    }

    /// Serializes `value` in this file's format and saves it under the lock.
    pub fn save_value(&self, value: &JsonValue) -> Result<(), RecordFileError> {
        let content = match self.format {
            RecordFormat::Json => serde_json::to_string_pretty(value)?,
            RecordFormat::Toml => toml::to_string_pretty(value)?,
        };
        self.save_str(&content)
    }

    /// Saves already formatted content under the lock.
    pub fn save_str(&self, content: &str) -> Result<(), RecordFileError> {
        self.ensure_parent()?;
        let _lock = FileLock::acquire(&self.lock_path())?;
        self.write_atomic(content.as_bytes())
    }

    /// Removes the file. A missing file is not an error.
    ///
    /// Returns true when a file was removed.
    pub fn remove(&self) -> Result<bool, RecordFileError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let _lock = FileLock::acquire(&self.lock_path())?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_parent(&self) -> Result<(), RecordFileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), RecordFileError> {
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, RecordFileError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| RecordFileError::InvalidPath("path has no parent directory".into()))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| RecordFileError::InvalidPath("path has no file name".into()))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// An exclusive lock on a lock file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks until the exclusive lock is held.
    pub fn acquire(lock_path: &Path) -> Result<Self, RecordFileError> {
        let file = Self::open(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| RecordFileError::Lock(format!("Failed to acquire lock: {e}")))?;
        Ok(Self { file })
    }

    /// Takes the lock if nobody else holds it.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>, RecordFileError> {
        let file = Self::open(lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(RecordFileError::Lock(format!("Failed to acquire lock: {e}"))),
        }
    }

    fn open(lock_path: &Path) -> Result<File, RecordFileError> {
        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?)
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_json_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::json(temp_dir.path().join("nested/record.json"));

        file.save_value(&json!({"version": "2.0.0", "cursor": 1})).unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded["cursor"], 1);
        assert_eq!(loaded["version"], "2.0.0");
    }

    #[test]
    fn test_toml_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::toml(temp_dir.path().join("config.toml"));

        file.save_value(&json!({"version": "1.0.0", "log_level": "debug"}))
            .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("log_level = \"debug\""));
        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded["log_level"], "debug");
    }

    #[test]
    fn test_load_missing_and_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::json(temp_dir.path().join("record.json"));
        assert!(file.load().unwrap().is_none());

        fs::write(file.path(), "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::json(temp_dir.path().join("record.json"));
        file.save_str("{}").unwrap();

        assert!(!temp_dir.path().join(".record.json.tmp").exists());
        assert!(file.path().exists());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::json(temp_dir.path().join("record.json"));
        file.save_value(&json!({"n": 1})).unwrap();
        file.save_value(&json!({"n": 2})).unwrap();
        assert_eq!(file.load().unwrap().unwrap(), json!({"n": 2}));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let file = RecordFile::json(temp_dir.path().join("record.json"));
        file.save_str("{}").unwrap();

        assert!(file.remove().unwrap());
        assert!(!file.remove().unwrap());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_try_acquire_reports_contention() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("store.lock");

        let held = FileLock::try_acquire(&lock_path).unwrap();
        assert!(held.is_some());
        assert!(FileLock::try_acquire(&lock_path).unwrap().is_none());

        drop(held);
        assert!(FileLock::try_acquire(&lock_path).unwrap().is_some());
    }
}
