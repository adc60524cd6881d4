use anyhow::{Context, Result};

use pixshop_core::settings::{SettingsRepository, Theme, Tier};

use crate::context::AppContext;

/// Parses `name=true|false`.
pub fn parse_toggle(raw: &str) -> Result<(String, bool), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=true|false, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("toggle name is empty".to_string());
    }
    let enabled = match value.trim() {
        "true" | "on" | "1" => true,
        "false" | "off" | "0" => false,
        other => return Err(format!("invalid toggle value `{other}`")),
    };
    Ok((name.to_string(), enabled))
}

pub async fn run(
    ctx: &AppContext,
    theme: Option<Theme>,
    tier: Option<Tier>,
    toggles: Vec<(String, bool)>,
) -> Result<()> {
    let mut settings = ctx.load_settings().await?;
    let changed = theme.is_some() || tier.is_some() || !toggles.is_empty();

    if let Some(theme) = theme {
        settings.theme = theme;
    }
    if let Some(tier) = tier {
        settings.tier = tier;
    }
    for (name, enabled) in toggles {
        settings.set_toggle(name, enabled);
    }
    if changed {
        ctx.settings
            .save(&settings)
            .await
            .context("Failed to save settings")?;
    }

    println!("Settings: {}", ctx.settings.path().display());
    println!("  theme: {:?}", settings.theme);
    println!("  tier:  {:?}", settings.tier);
    for (name, enabled) in &settings.toggles {
        println!("  toggle {name}: {}", if *enabled { "on" } else { "off" });
    }
    for (widget, pos) in &settings.widget_positions {
        println!("  widget {widget}: ({}, {})", pos.x, pos.y);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggle() {
        assert_eq!(parse_toggle("hd=true"), Ok(("hd".to_string(), true)));
        assert_eq!(parse_toggle(" magic-eraser = off"), Ok(("magic-eraser".to_string(), false)));
        assert!(parse_toggle("hd").is_err());
        assert!(parse_toggle("=true").is_err());
        assert!(parse_toggle("hd=maybe").is_err());
    }
}
