//! History commands: inspect, import, export, undo/redo, clear and reset.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use pixshop_core::history::{EntryContent, HistoryEntry};
use pixshop_core::image::{DEFAULT_IMAGE_MIME, ImageFile};
use pixshop_core::session::PersistOutcome;
use pixshop_infrastructure::codec::{mime_for_name, sniff_mime};

use crate::context::AppContext;

pub async fn show(ctx: &AppContext) -> Result<()> {
    let editor = ctx.editor().await?;
    let timeline = editor.timeline();

    println!("Store: {}", ctx.store_dir.display());
    if timeline.is_empty() {
        println!("No saved session.");
        return Ok(());
    }
    if let Some(tab) = editor.active_tab_id() {
        println!("Active tab: {tab}");
    }

    for (index, entry) in timeline.entries().iter().enumerate() {
        let marker = if timeline.cursor() == Some(index) { '>' } else { ' ' };
        println!("{marker} {index:>3}  {}", describe(entry));
    }
    Ok(())
}

fn describe(entry: &HistoryEntry) -> String {
    let source = match &entry.content {
        EntryContent::Binary(file) if file.is_empty() => {
            format!("{} (unavailable)", file.name)
        }
        EntryContent::Binary(file) => format!("{} ({} bytes)", file.name, file.len()),
        EntryContent::RemoteUrl(url) => url.clone(),
        EntryContent::LegacyEncoded(data) => format!("inline data ({} chars)", data.len()),
    };
    match &entry.prompt {
        Some(prompt) => format!("{:<14} {source}  \"{prompt}\"", entry.kind),
        None => format!("{:<14} {source}", entry.kind),
    }
}

pub async fn import(ctx: &AppContext, images: &[PathBuf]) -> Result<()> {
    let mut editor = ctx.editor().await?;
    for path in images {
        let file = read_image(path).await?;
        let outcome = editor.upload(file).await;
        println!("Imported {}{}", path.display(), suffix(outcome));
    }
    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let metadata = tokio::fs::metadata(path).await?;
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or_default();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mime_type = sniff_mime(&bytes)
        .map(str::to_string)
        .or_else(|| mime_for_name(&name))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

    Ok(ImageFile::new(name, mime_type, last_modified, bytes))
}

pub async fn export(ctx: &AppContext, path: &Path) -> Result<()> {
    let editor = ctx.editor().await?;
    let written = editor.export_current(path).await?;
    println!("Wrote {}", written.display());
    Ok(())
}

pub async fn undo(ctx: &AppContext) -> Result<()> {
    let mut editor = ctx.editor().await?;
    match editor.undo().await {
        Some(outcome) => println!("{}{}", position(&editor), suffix(outcome)),
        None => println!("Nothing to undo."),
    }
    Ok(())
}

pub async fn redo(ctx: &AppContext) -> Result<()> {
    let mut editor = ctx.editor().await?;
    match editor.redo().await {
        Some(outcome) => println!("{}{}", position(&editor), suffix(outcome)),
        None => println!("Nothing to redo."),
    }
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    let mut editor = ctx.editor().await?;
    if !editor.clear().await.is_persisted() {
        bail!("Session could not be cleared, see log for details");
    }
    println!("Session cleared.");
    Ok(())
}

pub async fn reset(ctx: &AppContext) -> Result<()> {
    let mut editor = ctx.editor().await?;
    if !editor.factory_reset().await.is_persisted() {
        bail!("Store could not be removed, see log for details");
    }
    println!("Removed {}", ctx.store_dir.display());
    Ok(())
}

pub(crate) fn position(editor: &pixshop_application::EditorSession) -> String {
    let timeline = editor.timeline();
    match timeline.cursor() {
        Some(cursor) => format!("At entry {} of {}", cursor + 1, timeline.len()),
        None => "History is empty".to_string(),
    }
}

pub(crate) fn suffix(outcome: PersistOutcome) -> &'static str {
    match outcome {
        PersistOutcome::Persisted => "",
        PersistOutcome::Skipped => " (not saved)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_image_sniffs_mime_and_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scan.bin");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]).unwrap();

        let file = read_image(&path).await.unwrap();
        assert_eq!(file.name, "scan.bin");
        assert_eq!(file.mime_type, "image/png");
        assert!(file.last_modified_at > 0);
    }

    #[tokio::test]
    async fn test_read_image_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_image(&temp_dir.path().join("nope.png")).await.is_err());
    }
}
