//! Session-scoped AI configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;
use crate::domain::routing::ModelRouter;

/// Default primary model when none is configured.
pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o-mini";

/// How models are chosen for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// The provider's own triage picks the model.
    #[default]
    Default,
    /// The configured primary model answers.
    Single,
    /// Primary and secondary models both answer.
    Multi,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Default => "default",
            ChatMode::Single => "single",
            ChatMode::Multi => "multi",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "auto" => Ok(ChatMode::Default),
            "single" => Ok(ChatMode::Single),
            "multi" => Ok(ChatMode::Multi),
            other => Err(ValidationError::unknown_variant("mode", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub rag: bool,
    pub web_search: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisionSettings {
    pub enabled: bool,
    pub high_detail: bool,
}

/// Feature flags that travel with a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnFeatures {
    pub rag: bool,
    pub web_search: bool,
    pub knowledge_base: bool,
    pub tool_access: bool,
    pub vision: bool,
    pub high_detail_vision: bool,
}

/// Active feature toggles for one chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AIConfig {
    pub mode: ChatMode,
    pub retrieval: RetrievalSettings,
    pub knowledge_base: bool,
    pub tool_access: bool,
    pub primary_model: String,
    pub secondary_model: Option<String>,
    pub split_screen: bool,
    pub vision: VisionSettings,
}

impl AIConfig {
    pub fn with_primary_model(primary_model: impl Into<String>) -> Self {
        Self {
            mode: ChatMode::Default,
            retrieval: RetrievalSettings::default(),
            knowledge_base: false,
            tool_access: false,
            primary_model: primary_model.into(),
            secondary_model: None,
            split_screen: false,
            vision: VisionSettings::default(),
        }
    }

    /// Two lanes only when the mode is multi and split screen is on.
    pub fn is_split(&self) -> bool {
        self.mode == ChatMode::Multi && self.split_screen
    }

    /// The provider picks the model only in default mode.
    pub fn auto_route(&self) -> bool {
        self.mode == ChatMode::Default
    }

    /// Explicit secondary model, or the router's complement of the primary.
    pub fn resolved_secondary_model(&self, router: &ModelRouter) -> String {
        self.secondary_model
            .clone()
            .unwrap_or_else(|| router.complement_of(&self.primary_model))
    }

    pub fn features(&self) -> TurnFeatures {
        TurnFeatures {
            rag: self.retrieval.rag,
            web_search: self.retrieval.web_search,
            knowledge_base: self.knowledge_base,
            tool_access: self.tool_access,
            vision: self.vision.enabled,
            high_detail_vision: self.vision.enabled && self.vision.high_detail,
        }
    }
}

impl Default for AIConfig {
    fn default() -> Self {
        Self::with_primary_model(DEFAULT_PRIMARY_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_single_lane_auto_routed() {
        let config = AIConfig::default();
        assert_eq!(config.mode, ChatMode::Default);
        assert!(config.auto_route());
        assert!(!config.is_split());
    }

    #[test]
    fn split_requires_multi_mode_and_split_screen() {
        let mut config = AIConfig::default();
        config.split_screen = true;
        assert!(!config.is_split());
        config.mode = ChatMode::Multi;
        assert!(config.is_split());
        config.split_screen = false;
        assert!(!config.is_split());
    }

    #[test]
    fn secondary_model_defaults_to_router_complement() {
        let router = ModelRouter::default();
        let mut config = AIConfig::with_primary_model("gpt-4o");
        assert_eq!(config.resolved_secondary_model(&router), "claude-3-5-sonnet-latest");
        config.secondary_model = Some("gemini-1.5-pro".into());
        assert_eq!(config.resolved_secondary_model(&router), "gemini-1.5-pro");
    }

    #[test]
    fn high_detail_vision_requires_vision_enabled() {
        let mut config = AIConfig::default();
        config.vision.high_detail = true;
        assert!(!config.features().high_detail_vision);
        config.vision.enabled = true;
        assert!(config.features().high_detail_vision);
    }

    #[test]
    fn mode_parses_auto_alias() {
        assert_eq!("AUTO".parse::<ChatMode>().unwrap(), ChatMode::Default);
        assert!("dual".parse::<ChatMode>().is_err());
    }
}
