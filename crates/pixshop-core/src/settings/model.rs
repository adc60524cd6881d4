//! Application settings domain model.
//!
//! Settings that outlive a session (theme, plan tier, feature toggles and the
//! positions of floating widgets) live in this explicit struct and are
//! persisted through [`super::SettingsRepository`], separately from the
//! session history store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

/// Screen position of a draggable widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: f32,
    pub y: f32,
}

/// Settings that persist across sessions and restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub theme: Theme,
    pub tier: Tier,
    /// Named feature toggles.
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
    /// Last position of each floating widget, keyed by widget id.
    #[serde(default)]
    pub widget_positions: BTreeMap<String, WidgetPosition>,
}

impl AppSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a toggle value; unknown toggles are off.
    pub fn toggle(&self, name: &str) -> bool {
        self.toggles.get(name).copied().unwrap_or(false)
    }

    pub fn set_toggle(&mut self, name: impl Into<String>, enabled: bool) {
        self.toggles.insert(name.into(), enabled);
    }

    pub fn widget_position(&self, widget_id: &str) -> Option<WidgetPosition> {
        self.widget_positions.get(widget_id).copied()
    }

    pub fn set_widget_position(&mut self, widget_id: impl Into<String>, position: WidgetPosition) {
        self.widget_positions.insert(widget_id.into(), position);
    }

    /// Flags recorded with a saved session so it can be restored in the same
    /// look and mode.
    pub fn session_flags(&self) -> crate::session::SessionFlags {
        let mut flags = crate::session::SessionFlags::new();
        flags.insert("theme".to_string(), serde_json::json!(self.theme));
        flags.insert("tier".to_string(), serde_json::json!(self.tier));
        for (name, enabled) in &self.toggles {
            flags.insert(format!("toggle.{name}"), serde_json::json!(enabled));
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::new();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.tier, Tier::Free);
        assert!(!settings.toggle("magic-eraser"));
    }

    #[test]
    fn test_toggles_and_positions() {
        let mut settings = AppSettings::new();
        settings.set_toggle("magic-eraser", true);
        settings.set_widget_position("toolbox", WidgetPosition { x: 12.0, y: 40.5 });

        assert!(settings.toggle("magic-eraser"));
        assert_eq!(
            settings.widget_position("toolbox"),
            Some(WidgetPosition { x: 12.0, y: 40.5 })
        );
        assert_eq!(settings.widget_position("palette"), None);
    }

    #[test]
    fn test_session_flags() {
        let mut settings = AppSettings::new();
        settings.theme = Theme::Light;
        settings.set_toggle("hd", true);

        let flags = settings.session_flags();
        assert_eq!(flags["theme"], serde_json::json!("light"));
        assert_eq!(flags["tier"], serde_json::json!("free"));
        assert_eq!(flags["toggle.hd"], serde_json::json!(true));
    }
}
