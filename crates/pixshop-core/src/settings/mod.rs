//! Application settings module.

mod model;
mod repository;

pub use model::{AppSettings, Theme, Tier, WidgetPosition};
pub use repository::SettingsRepository;
