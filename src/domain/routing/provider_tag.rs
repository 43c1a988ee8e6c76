//! Provider families a model id can belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    #[default]
    OpenAi,
    Anthropic,
    Google,
    Mistral,
    DeepSeek,
    Meta,
    Xai,
}

impl ProviderTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTag::OpenAi => "openai",
            ProviderTag::Anthropic => "anthropic",
            ProviderTag::Google => "google",
            ProviderTag::Mistral => "mistral",
            ProviderTag::DeepSeek => "deepseek",
            ProviderTag::Meta => "meta",
            ProviderTag::Xai => "xai",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderTag::OpenAi),
            "anthropic" => Ok(ProviderTag::Anthropic),
            "google" => Ok(ProviderTag::Google),
            "mistral" => Ok(ProviderTag::Mistral),
            "deepseek" => Ok(ProviderTag::DeepSeek),
            "meta" => Ok(ProviderTag::Meta),
            "xai" => Ok(ProviderTag::Xai),
            other => Err(ValidationError::unknown_variant("provider", other)),
        }
    }
}
