//! Model gateway configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::routing::ProviderTag;
use crate::domain::settings::DEFAULT_PRIMARY_MODEL;

/// Model gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gateway base URL. Without one the mock provider is used.
    pub gateway_url: Option<String>,

    /// Bearer token for the gateway
    pub api_key: Option<String>,

    /// Model used for single mode and the primary lane
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Secondary lane model; the router picks a complement when unset
    pub secondary_model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Provider assumed for model ids no vendor marker matches
    #[serde(default)]
    pub fallback_provider: ProviderTag,
}

impl AiConfig {
    /// Check if a real gateway is configured
    pub fn has_gateway(&self) -> bool {
        self.gateway_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.gateway_url.as_deref().filter(|u| !u.is_empty()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidGatewayUrl);
            }
        }
        if self.primary_model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__PRIMARY_MODEL"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            api_key: None,
            primary_model: default_primary_model(),
            secondary_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            fallback_provider: ProviderTag::default(),
        }
    }
}

fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}
