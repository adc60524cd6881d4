use anyhow::{Result, anyhow};

use pixshop_core::PixshopError;
use pixshop_core::generation::GenerationConfig;
use pixshop_core::history::EntryKind;

use super::session::{position, suffix};
use crate::context::AppContext;

pub async fn generate(ctx: &AppContext, prompt: &str, config: GenerationConfig) -> Result<()> {
    let mut editor = ctx.editor().await?;
    let outcome = editor
        .generate(prompt, &config)
        .await
        .map_err(user_facing)?;
    println!("Generated. {}{}", position(&editor), suffix(outcome));
    Ok(())
}

pub async fn edit(
    ctx: &AppContext,
    prompt: &str,
    kind: EntryKind,
    config: GenerationConfig,
) -> Result<()> {
    let mut editor = ctx.editor().await?;
    let outcome = editor
        .transform(prompt, kind, &config)
        .await
        .map_err(user_facing)?;
    println!("Applied {kind}. {}{}", position(&editor), suffix(outcome));
    Ok(())
}

fn user_facing(err: PixshopError) -> anyhow::Error {
    match err {
        PixshopError::GenerationProvider(e) => anyhow!(e.user_message()),
        other => other.into(),
    }
}
