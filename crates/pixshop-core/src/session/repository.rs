//! Session store trait.
//!
//! Defines the interface of the persistent backend that holds the session
//! record.

use async_trait::async_trait;

use super::model::{DestroyOutcome, StoredSession};
use crate::error::Result;

/// An embedded key-value store holding the single session record.
///
/// This trait decouples the session manager from the storage mechanism
/// (directory of files, embedded database, browser storage).
///
/// # Implementation Notes
///
/// Implementations should:
/// - open lazily and idempotently, creating the collection on first use
/// - make `write` atomic: a later `read` sees either the old or the new
///   record, never a partial one
/// - treat an absent record as `Ok(None)`, not as an error
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens the store, creating or upgrading its schema if needed.
    ///
    /// Upgrades only add missing collections; existing data is kept.
    async fn open(&self) -> Result<()>;

    /// Reads the session record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: A record exists
    /// - `Ok(None)`: Nothing has been saved yet
    /// - `Err(_)`: The store could not be read
    async fn read(&self) -> Result<Option<StoredSession>>;

    /// Replaces the session record wholesale.
    async fn write(&self, record: &StoredSession) -> Result<()>;

    /// Removes the session record, keeping the store and its schema.
    ///
    /// Succeeds when there is no record.
    async fn delete_record(&self) -> Result<()>;

    /// Removes the whole store. The next `open` recreates it.
    ///
    /// A store held open elsewhere is reported as [`DestroyOutcome::Blocked`]
    /// rather than as an error.
    async fn destroy_all(&self) -> Result<DestroyOutcome>;
}
