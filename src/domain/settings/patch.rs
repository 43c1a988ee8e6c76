//! Partial configuration updates and their side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AIConfig, ChatMode};

/// A toggleable feature, for user-facing notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Rag,
    WebSearch,
    KnowledgeBase,
    ToolAccess,
    Vision,
    HighDetailVision,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Feature::Rag => "Retrieval augmentation",
            Feature::WebSearch => "Web search",
            Feature::KnowledgeBase => "Knowledge base",
            Feature::ToolAccess => "Tool access",
            Feature::Vision => "Vision",
            Feature::HighDetailVision => "High-detail vision",
        };
        write!(f, "{}", label)
    }
}

/// A user-facing toast describing a configuration change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigNotice {
    ModeChanged { from: ChatMode, to: ChatMode },
    SplitScreenToggled { enabled: bool },
    FeatureToggled { feature: Feature, enabled: bool },
    PrimaryModelChanged { model: String },
    SecondaryModelChanged { model: Option<String> },
}

impl fmt::Display for ConfigNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigNotice::ModeChanged { to, .. } => write!(f, "Switched to {} mode", to),
            ConfigNotice::SplitScreenToggled { enabled: true } => write!(f, "Split screen enabled"),
            ConfigNotice::SplitScreenToggled { enabled: false } => write!(f, "Split screen disabled"),
            ConfigNotice::FeatureToggled { feature, enabled } => {
                write!(f, "{} {}", feature, if *enabled { "enabled" } else { "disabled" })
            }
            ConfigNotice::PrimaryModelChanged { model } => write!(f, "Primary model set to {}", model),
            ConfigNotice::SecondaryModelChanged { model: Some(model) } => {
                write!(f, "Secondary model set to {}", model)
            }
            ConfigNotice::SecondaryModelChanged { model: None } => {
                write!(f, "Secondary model chosen automatically")
            }
        }
    }
}

/// Partial update; `None` leaves a field untouched.
///
/// `secondary_model: Some(None)` clears an explicit secondary model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AIConfigPatch {
    pub mode: Option<ChatMode>,
    pub rag: Option<bool>,
    pub web_search: Option<bool>,
    pub knowledge_base: Option<bool>,
    pub tool_access: Option<bool>,
    pub primary_model: Option<String>,
    pub secondary_model: Option<Option<String>>,
    pub split_screen: Option<bool>,
    pub vision: Option<bool>,
    pub high_detail_vision: Option<bool>,
}

impl AIConfigPatch {
    pub fn mode(mode: ChatMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn split_screen(enabled: bool) -> Self {
        Self {
            split_screen: Some(enabled),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What applying a patch changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChange {
    pub lanes_cleared: bool,
    pub notices: Vec<ConfigNotice>,
}

fn toggle(
    slot: &mut bool,
    value: Option<bool>,
    feature: Feature,
    notices: &mut Vec<ConfigNotice>,
) {
    if let Some(enabled) = value {
        if *slot != enabled {
            *slot = enabled;
            notices.push(ConfigNotice::FeatureToggled { feature, enabled });
        }
    }
}

impl AIConfig {
    /// Applies `patch` in place.
    ///
    /// Lanes must be cleared when the mode leaves multi or split screen is
    /// switched off.
    pub fn apply(&mut self, patch: AIConfigPatch) -> ConfigChange {
        let mut notices = Vec::new();
        let mut lanes_cleared = false;

        if let Some(mode) = patch.mode {
            if mode != self.mode {
                if self.mode == ChatMode::Multi {
                    lanes_cleared = true;
                }
                notices.push(ConfigNotice::ModeChanged {
                    from: self.mode,
                    to: mode,
                });
                self.mode = mode;
            }
        }

        if let Some(enabled) = patch.split_screen {
            if enabled != self.split_screen {
                if !enabled {
                    lanes_cleared = true;
                }
                self.split_screen = enabled;
                notices.push(ConfigNotice::SplitScreenToggled { enabled });
            }
        }

        toggle(&mut self.retrieval.rag, patch.rag, Feature::Rag, &mut notices);
        toggle(&mut self.retrieval.web_search, patch.web_search, Feature::WebSearch, &mut notices);
        toggle(&mut self.knowledge_base, patch.knowledge_base, Feature::KnowledgeBase, &mut notices);
        toggle(&mut self.tool_access, patch.tool_access, Feature::ToolAccess, &mut notices);
        toggle(&mut self.vision.enabled, patch.vision, Feature::Vision, &mut notices);
        toggle(
            &mut self.vision.high_detail,
            patch.high_detail_vision,
            Feature::HighDetailVision,
            &mut notices,
        );

        if let Some(model) = patch.primary_model {
            if model != self.primary_model {
                self.primary_model = model.clone();
                notices.push(ConfigNotice::PrimaryModelChanged { model });
            }
        }

        if let Some(model) = patch.secondary_model {
            if model != self.secondary_model {
                self.secondary_model = model.clone();
                notices.push(ConfigNotice::SecondaryModelChanged { model });
            }
        }

        ConfigChange {
            lanes_cleared,
            notices,
        }
    }
}
