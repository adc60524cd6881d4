//! File-backed session store.
//!
//! Keeps the single session record as versioned JSON inside a store
//! directory:
//!
//! ```text
//! <root>/
//! ├── meta.json              # schema version and collections
//! └── session/
//!     ├── current.json       # the record
//!     └── current.lock       # exclusive write lock
//! ```
//!
//! All file I/O runs on the blocking pool via `tokio::task::spawn_blocking`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};
use version_migrate::Migrator;

use pixshop_core::error::Result;
use pixshop_core::session::{CURRENT_RECORD_KEY, DestroyOutcome, SessionStore, StoredSession};
use pixshop_core::PixshopError;

use crate::dto::{SESSION_RECORD_ENTITY, create_session_record_migrator, ensure_version_tag};
use crate::paths::PixshopPaths;
use crate::storage::{FileLock, RecordFile};

/// Current layout version of the store directory.
pub const STORE_SCHEMA_VERSION: u32 = 2;

const META_FILENAME: &str = "meta.json";
const SESSION_COLLECTION: &str = "session";

/// Collections the current schema requires.
const REQUIRED_COLLECTIONS: &[&str] = &[SESSION_COLLECTION];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreMeta {
    #[serde(default)]
    schema_version: u32,
    #[serde(default)]
    collections: Vec<String>,
}

/// Session store rooted at a directory.
#[derive(Clone)]
pub struct FileSessionStore {
    root: PathBuf,
    migrator: Arc<Migrator>,
}

impl FileSessionStore {
    /// Creates a store rooted at `root`. Nothing touches the disk until
    /// [`SessionStore::open`] or a read/write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            migrator: Arc::new(create_session_record_migrator()),
        }
    }

    /// Creates a store in the platform data directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(PixshopPaths::store_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the lock guarding the session record.
    pub fn record_lock_path(&self) -> PathBuf {
        Self::record_file(&self.root).lock_path()
    }

    fn record_file(root: &Path) -> RecordFile {
        RecordFile::json(
            root.join(SESSION_COLLECTION)
                .join(format!("{CURRENT_RECORD_KEY}.json")),
        )
    }

    fn open_sync(root: &Path) -> Result<()> {
        fs::create_dir_all(root)
            .map_err(|e| PixshopError::backend("open", format!("{}: {e}", root.display())))?;

        let meta_file = RecordFile::json(root.join(META_FILENAME));
        let mut meta: StoreMeta = match meta_file
            .load()
            .map_err(|e| PixshopError::backend("open", e.to_string()))?
        {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "Unreadable store metadata, rebuilding it");
                StoreMeta::default()
            }),
            None => StoreMeta::default(),
        };

        let mut changed = meta.schema_version < STORE_SCHEMA_VERSION;
        for collection in REQUIRED_COLLECTIONS {
            let dir = root.join(collection);
            if !dir.exists() {
                fs::create_dir_all(&dir)
                    .map_err(|e| PixshopError::backend("open", format!("{}: {e}", dir.display())))?;
            }
            if !meta.collections.iter().any(|c| c == collection) {
                meta.collections.push((*collection).to_string());
                changed = true;
            }
        }

        if changed {
            info!(
                from = meta.schema_version,
                to = STORE_SCHEMA_VERSION,
                "Upgrading session store schema"
            );
            meta.schema_version = meta.schema_version.max(STORE_SCHEMA_VERSION);
            let value = serde_json::to_value(&meta)?;
            meta_file
                .save_value(&value)
                .map_err(|e| PixshopError::backend("open", e.to_string()))?;
        }
        Ok(())
    }

    fn read_sync(root: &Path, migrator: &Migrator) -> Result<Option<StoredSession>> {
        Self::open_sync(root)?;

        let file = Self::record_file(root);
        let Some(mut value) = file
            .load()
            .map_err(|e| PixshopError::backend("read", e.to_string()))?
        else {
            debug!(path = %file.path().display(), "No session record");
            return Ok(None);
        };

        ensure_version_tag(&mut value);
        let record: StoredSession = migrator.load_flat_from(SESSION_RECORD_ENTITY, value)?;
        debug!(entries = record.entries.len(), cursor = record.cursor, "Read session record");
        Ok(Some(record))
    }

    fn write_sync(root: &Path, migrator: &Migrator, record: StoredSession) -> Result<()> {
        Self::open_sync(root)?;

        let entries = record.entries.len();
        let json = migrator.save_domain_flat(SESSION_RECORD_ENTITY, record)?;
        Self::record_file(root)
            .save_str(&json)
            .map_err(|e| PixshopError::backend("write", e.to_string()))?;
        debug!(entries, "Wrote session record");
        Ok(())
    }

    fn delete_sync(root: &Path) -> Result<()> {
        let removed = Self::record_file(root)
            .remove()
            .map_err(|e| PixshopError::backend("delete", e.to_string()))?;
        debug!(removed, "Deleted session record");
        Ok(())
    }

    fn destroy_sync(root: &Path) -> Result<DestroyOutcome> {
        if !root.exists() {
            return Ok(DestroyOutcome::NotPresent);
        }

        let lock_path = Self::record_file(root).lock_path();
        let blocked = match FileLock::try_acquire(&lock_path) {
            Ok(Some(_guard)) => false,
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "Could not probe session store lock");
                false
            }
        };

        match fs::remove_dir_all(root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DestroyOutcome::NotPresent),
            Err(e) => {
                return Err(PixshopError::backend(
                    "destroy",
                    format!("{}: {e}", root.display()),
                ));
            }
        }

        if blocked {
            warn!(path = %root.display(), "Session store was held open elsewhere during destroy");
            Ok(DestroyOutcome::Blocked)
        } else {
            info!(path = %root.display(), "Destroyed session store");
            Ok(DestroyOutcome::Destroyed)
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn open(&self) -> Result<()> {
        let root = self.root.clone();
        task::spawn_blocking(move || Self::open_sync(&root))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }

    async fn read(&self) -> Result<Option<StoredSession>> {
        let root = self.root.clone();
        let migrator = Arc::clone(&self.migrator);
        task::spawn_blocking(move || Self::read_sync(&root, &migrator))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }

    async fn write(&self, record: &StoredSession) -> Result<()> {
        let root = self.root.clone();
        let migrator = Arc::clone(&self.migrator);
        let record = record.clone();
        task::spawn_blocking(move || Self::write_sync(&root, &migrator, record))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }

    async fn delete_record(&self) -> Result<()> {
        let root = self.root.clone();
        task::spawn_blocking(move || Self::delete_sync(&root))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }

    async fn destroy_all(&self) -> Result<DestroyOutcome> {
        let root = self.root.clone();
        task::spawn_blocking(move || Self::destroy_sync(&root))
            .await
            .map_err(|e| PixshopError::internal(format!("Failed to spawn blocking task: {e}")))?
    }
}
