//! Settings module - the per-session AI configuration and the rules for
//! changing it.

mod ai_config;
mod patch;

pub use ai_config::{
    AIConfig, ChatMode, RetrievalSettings, TurnFeatures, VisionSettings, DEFAULT_PRIMARY_MODEL,
};
pub use patch::{AIConfigPatch, ConfigChange, ConfigNotice, Feature};
