//! Editing use case.
//!
//! Ties the in-memory [`Timeline`] to the generation service and to the
//! session manager. Every change to the timeline is followed by an autosave;
//! a failed save never undoes the change.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use pixshop_core::PixshopError;
use pixshop_core::error::Result;
use pixshop_core::generation::{GenerationConfig, GenerationError, GenerationService};
use pixshop_core::history::{EntryContent, EntryKind, HistoryEntry, Timeline};
use pixshop_core::image::ImageFile;
use pixshop_core::session::{PersistOutcome, SessionFlags, SessionState};
use pixshop_infrastructure::codec::decode_data_url;

use crate::session::SessionManager;

/// The user's editing session: timeline, generator and persistence.
pub struct EditorSession {
    timeline: Timeline,
    generator: Arc<dyn GenerationService>,
    manager: Arc<SessionManager>,
    active_tab_id: Option<String>,
    flags: SessionFlags,
}

impl EditorSession {
    pub fn new(generator: Arc<dyn GenerationService>, manager: Arc<SessionManager>) -> Self {
        Self {
            timeline: Timeline::new(),
            generator,
            manager,
            active_tab_id: None,
            flags: SessionFlags::new(),
        }
    }

    /// Sets the flags saved with every autosave.
    pub fn with_flags(mut self, flags: SessionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.timeline.current()
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn set_active_tab(&mut self, tab_id: Option<String>) {
        self.active_tab_id = tab_id;
    }

    /// Loads the persisted session into the timeline.
    ///
    /// Stored flags only fill keys the current flags lack; the current
    /// settings win.
    pub async fn restore(&mut self) -> SessionState {
        match self.manager.load_session().await {
            Some(snapshot) => {
                let state = snapshot.state();
                self.timeline = Timeline::from_parts(snapshot.entries, snapshot.cursor);
                self.active_tab_id = snapshot.active_tab_id;
                let mut flags = snapshot.flags;
                flags.extend(std::mem::take(&mut self.flags));
                self.flags = flags;
                state
            }
            None => {
                self.timeline.clear();
                SessionState::Empty
            }
        }
    }

    /// Adds a user supplied image and saves.
    pub async fn upload(&mut self, file: ImageFile) -> PersistOutcome {
        info!(name = %file.name, bytes = file.len(), "Uploading image");
        self.timeline.push(HistoryEntry::upload(file));
        self.save().await
    }

    /// Generates a new image from a prompt and adds it as a generation step.
    ///
    /// On failure the timeline is left untouched.
    pub async fn generate(
        &mut self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<PersistOutcome> {
        let data_url = self.generator.generate(prompt, config).await.map_err(|e| {
            warn!(error = %e, "Generation failed");
            e
        })?;
        let file = decode_result(&data_url, EntryKind::Generation)?;
        self.push_result(file, EntryKind::Generation, prompt).await
    }

    /// Applies a prompt to the current image and adds the result.
    ///
    /// `kind` is normally [`EntryKind::Edit`] for a localized retouch or
    /// [`EntryKind::Transformation`] for whole-image filters and adjustments.
    /// On failure the timeline is left untouched.
    pub async fn transform(
        &mut self,
        prompt: &str,
        kind: EntryKind,
        config: &GenerationConfig,
    ) -> Result<PersistOutcome> {
        let source = self.current_image().ok_or_else(|| {
            GenerationError::InvalidRequest("no current image to edit".to_string())
        })?;
        let data_url = self
            .generator
            .transform(&source, prompt, config)
            .await
            .map_err(|e| {
                warn!(error = %e, %kind, "Transform failed");
                e
            })?;
        let file = decode_result(&data_url, kind)?;
        self.push_result(file, kind, prompt).await
    }

    /// Steps back. Returns `None` when already at the first entry.
    pub async fn undo(&mut self) -> Option<PersistOutcome> {
        if !self.timeline.undo() {
            return None;
        }
        Some(self.save().await)
    }

    /// Steps forward. Returns `None` when already at the last entry.
    pub async fn redo(&mut self) -> Option<PersistOutcome> {
        if !self.timeline.redo() {
            return None;
        }
        Some(self.save().await)
    }

    /// Writes the current image to `path`.
    ///
    /// When `path` is an existing directory the entry's own file name is
    /// used inside it. Returns the path written.
    pub async fn export_current(&self, path: &Path) -> Result<PathBuf> {
        let image = self
            .current_image()
            .ok_or_else(|| PixshopError::io("no current image to export"))?;

        let target = if path.is_dir() {
            path.join(&image.name)
        } else {
            path.to_path_buf()
        };
        tokio::fs::write(&target, &image.bytes).await?;
        info!(path = %target.display(), bytes = image.len(), "Exported current image");
        Ok(target)
    }

    /// Removes the persisted session and empties the timeline.
    pub async fn clear(&mut self) -> PersistOutcome {
        self.timeline.clear();
        self.manager.clear_session().await
    }

    /// Destroys the session store and empties the timeline.
    pub async fn factory_reset(&mut self) -> PersistOutcome {
        self.timeline.clear();
        self.active_tab_id = None;
        self.manager.reset_everything().await
    }

    /// Persists the timeline as it is now.
    pub async fn save(&self) -> PersistOutcome {
        self.manager
            .save_session(
                self.timeline.entries(),
                self.timeline.cursor(),
                self.active_tab_id.as_deref(),
                &self.flags,
            )
            .await
    }

    /// Binary content of the current entry, if it has any.
    fn current_image(&self) -> Option<ImageFile> {
        let entry = self.timeline.current()?;
        match &entry.content {
            EntryContent::Binary(file) if !file.is_empty() => Some(file.clone()),
            EntryContent::Binary(_) => None,
            EntryContent::LegacyEncoded(source) => match decode_data_url(source) {
                Ok(decoded) if !decoded.is_empty() => Some(ImageFile::new(
                    file_name(entry.kind, entry.created_at, &decoded.mime_type),
                    decoded.mime_type,
                    entry.created_at,
                    decoded.bytes,
                )),
                Ok(_) => None,
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "Current entry could not be decoded");
                    None
                }
            },
            EntryContent::RemoteUrl(url) => {
                debug!(%url, "Current entry is a remote URL");
                None
            }
        }
    }

    async fn push_result(
        &mut self,
        file: ImageFile,
        kind: EntryKind,
        prompt: &str,
    ) -> Result<PersistOutcome> {
        info!(%kind, bytes = file.len(), "Adding generated image");
        self.timeline.push(HistoryEntry::new(
            EntryContent::Binary(file),
            kind,
            Some(prompt.to_string()),
        ));
        Ok(self.save().await)
    }
}

/// Decodes a generation result into an image handle.
fn decode_result(data_url: &str, kind: EntryKind) -> std::result::Result<ImageFile, GenerationError> {
    let decoded =
        decode_data_url(data_url).map_err(|e| GenerationError::MalformedImage(e.to_string()))?;
    if decoded.is_empty() {
        return Err(GenerationError::MalformedImage("empty image payload".to_string()));
    }
    let now = Utc::now().timestamp_millis();
    Ok(ImageFile::new(
        file_name(kind, now, &decoded.mime_type),
        decoded.mime_type,
        now,
        decoded.bytes,
    ))
}

fn file_name(kind: EntryKind, timestamp: i64, mime_type: &str) -> String {
    let extension = mime_guess::get_mime_extensions_str(mime_type)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("png");
    format!("{kind}-{timestamp}.{extension}")
}
