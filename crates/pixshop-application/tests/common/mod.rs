//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pixshop_core::PixshopError;
use pixshop_core::error::Result;
use pixshop_core::generation::{GenerationConfig, GenerationError, GenerationService};
use pixshop_core::image::ImageFile;
use pixshop_core::session::{DestroyOutcome, SessionStore, StoredSession};

/// PNG signature padded to a plausible size.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

pub fn png_file(name: &str, tag: u8) -> ImageFile {
    let mut bytes = PNG_BYTES.to_vec();
    bytes.push(tag);
    ImageFile::new(name, "image/png", 1_700_000_000_000, bytes)
}

/// Session store held in memory.
#[derive(Default)]
pub struct InMemoryStore {
    record: Mutex<Option<StoredSession>>,
    present: Mutex<bool>,
    pub writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: StoredSession) -> Self {
        let store = Self::new();
        *store.record.lock().unwrap() = Some(record);
        *store.present.lock().unwrap() = true;
        store
    }

    pub fn record(&self) -> Option<StoredSession> {
        self.record.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn open(&self) -> Result<()> {
        *self.present.lock().unwrap() = true;
        Ok(())
    }

    async fn read(&self) -> Result<Option<StoredSession>> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn write(&self, record: &StoredSession) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn delete_record(&self) -> Result<()> {
        *self.record.lock().unwrap() = None;
        Ok(())
    }

    async fn destroy_all(&self) -> Result<DestroyOutcome> {
        let mut present = self.present.lock().unwrap();
        *self.record.lock().unwrap() = None;
        if *present {
            *present = false;
            Ok(DestroyOutcome::Destroyed)
        } else {
            Ok(DestroyOutcome::NotPresent)
        }
    }
}

/// Session store whose every operation fails.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

impl FailingStore {
    fn fail<T>(&self, operation: &str) -> Result<T> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PixshopError::backend(operation, "quota exceeded"))
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn open(&self) -> Result<()> {
        self.fail("open")
    }

    async fn read(&self) -> Result<Option<StoredSession>> {
        self.fail("read")
    }

    async fn write(&self, _record: &StoredSession) -> Result<()> {
        self.fail("write")
    }

    async fn delete_record(&self) -> Result<()> {
        self.fail("delete")
    }

    async fn destroy_all(&self) -> Result<DestroyOutcome> {
        self.fail("destroy")
    }
}

/// Generation service answering every call with the same result.
pub struct FakeGenerator {
    response: std::result::Result<String, GenerationError>,
    pub calls: AtomicUsize,
    pub last_source: Mutex<Option<ImageFile>>,
}

impl FakeGenerator {
    pub fn returning(data_url: impl Into<String>) -> Self {
        Self {
            response: Ok(data_url.into()),
            calls: AtomicUsize::new(0),
            last_source: Mutex::new(None),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
            last_source: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }

    async fn transform(
        &self,
        source: &ImageFile,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> std::result::Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_source.lock().unwrap() = Some(source.clone());
        self.response.clone()
    }
}
