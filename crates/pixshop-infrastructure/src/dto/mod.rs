//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the versioned on-disk schema. They stay private to the
//! infrastructure layer; the domain types in `pixshop-core` never carry a
//! version.
//!
//! ### SessionRecord Version History
//! - **1.0.0**: Unversioned browser record, base64 text payloads
//! - **2.0.0**: Binary payloads, entry ids, kinds, prompts
//!
//! ### AppSettings Version History
//! - **1.0.0**: Initial schema
//!
//! ### ConfigRoot Version History
//! - **1.0.0**: Initial schema

mod config_root;
mod session_record;
mod settings;

pub use config_root::{ConfigRootV1_0_0, GenerationSettingsV1_0_0, create_config_root_migrator};
pub use session_record::{
    LEGACY_RECORD_VERSION, LegacyEntryV1_0_0, PayloadDto, SESSION_RECORD_ENTITY,
    SerializedEntryV2_0_0, SessionRecordDTO, SessionRecordV1_0_0, SessionRecordV2_0_0,
    create_session_record_migrator, ensure_version_tag,
};
pub use settings::{AppSettingsV1_0_0, WidgetPositionV1_0_0, create_settings_migrator};
