//! Model Provider Port - Interface for the LLM gateway.
//!
//! The engine sends one `ModelRequest` per lane and receives either a
//! validated `ProviderReply` or an `AIError`. Wire replies are checked at
//! this boundary so the rest of the crate only sees well-formed data.
//!
//! # Example
//!
//! ```ignore
//! let request = ModelRequest::new(ProviderTag::OpenAi, "gpt-4o-mini", "Hello")
//!     .with_temperature(0.7)
//!     .with_max_tokens(1024);
//! let reply = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::conversation::{
    CollaborationInfo, CostLatencyEstimate, Lane, Message, MessageMetadata, MessageRole,
    TriageResult,
};
use crate::domain::events::FailureCategory;
use crate::domain::foundation::{ChatDomain, SessionId, TurnId, ValidationError};
use crate::domain::routing::ProviderTag;
use crate::domain::settings::TurnFeatures;

/// Port for model completions.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Runs one completion. No retries are attempted.
    async fn complete(&self, request: ModelRequest) -> Result<ProviderReply, AIError>;
}

/// One prior message sent as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for HistoryMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.content().to_string(),
        }
    }
}

/// Opaque image payload forwarded to vision-capable models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub media_type: String,
    /// Base64 data or a URL; never inspected.
    pub data: String,
}

/// Correlation data echoed back in logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub session_id: SessionId,
    pub turn_id: TurnId,
    pub lane: Option<Lane>,
    pub domain: ChatDomain,
}

/// A completion request for one lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub provider: ProviderTag,
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub history: Vec<HistoryMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub features: TurnFeatures,
    pub images: Vec<ImageAttachment>,
    pub auto_route: bool,
    pub metadata: Option<RequestMetadata>,
}

impl ModelRequest {
    pub fn new(provider: ProviderTag, model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            history: Vec::new(),
            temperature: 0.7,
            max_tokens: 1024,
            features: TurnFeatures::default(),
            images: Vec::new(),
            auto_route: false,
            metadata: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_features(mut self, features: TurnFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }

    pub fn with_auto_route(mut self, auto_route: bool) -> Self {
        self.auto_route = auto_route;
        self
    }

    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A validated provider reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub content: String,
    pub model_used: String,
    pub triage: Option<TriageResult>,
    pub estimates: Option<CostLatencyEstimate>,
    pub collaboration: Option<CollaborationInfo>,
}

impl ProviderReply {
    pub fn text(content: impl Into<String>, model_used: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model_used: model_used.into(),
            triage: None,
            estimates: None,
            collaboration: None,
        }
    }

    pub fn with_triage(mut self, triage: TriageResult) -> Self {
        self.triage = Some(triage);
        self
    }

    pub fn with_estimates(mut self, estimates: CostLatencyEstimate) -> Self {
        self.estimates = Some(estimates);
        self
    }

    /// Metadata to store on the resulting assistant message.
    pub fn metadata(&self, requested_model: &str) -> MessageMetadata {
        MessageMetadata {
            triage: self.triage.clone(),
            estimates: self.estimates.clone(),
            collaboration: self.collaboration.clone(),
            requested_model: (requested_model != self.model_used).then(|| requested_model.to_string()),
        }
    }
}

/// Triage block as it arrives on the wire. Missing fields default so that
/// validation, not deserialisation, decides what is malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTriage {
    pub complexity: String,
    pub domain: String,
    pub urgency: String,
    #[serde(alias = "displayFormat")]
    pub display_format: String,
    #[serde(alias = "emotionalTone")]
    pub emotional_tone: String,
    #[serde(alias = "visionRequired")]
    pub vision_required: bool,
    pub confidence: f64,
    #[serde(alias = "suggestedModel")]
    pub suggested_model: Option<String>,
}

impl TryFrom<RawTriage> for TriageResult {
    type Error = ValidationError;

    fn try_from(raw: RawTriage) -> Result<Self, Self::Error> {
        TriageResult::new(
            raw.complexity.parse()?,
            raw.domain,
            raw.urgency.parse()?,
            raw.display_format.parse()?,
            raw.emotional_tone.parse()?,
            raw.vision_required,
            raw.confidence,
            raw.suggested_model,
        )
    }
}

/// Unvalidated provider reply as deserialised from the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "modelUsed")]
    pub model: Option<String>,
    #[serde(default)]
    pub triage: Option<RawTriage>,
    #[serde(default)]
    pub estimates: Option<CostLatencyEstimate>,
    #[serde(default)]
    pub collaboration: Option<CollaborationInfo>,
}

impl RawProviderReply {
    /// Validates the wire reply.
    ///
    /// Empty content is an error. A malformed triage block is dropped with a
    /// warning rather than failing the whole reply.
    pub fn validate(self, requested_model: &str) -> Result<ProviderReply, AIError> {
        let content = self.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AIError::EmptyReply {
                model: requested_model.to_string(),
            });
        }

        let triage = match self.triage.map(TriageResult::try_from) {
            Some(Ok(triage)) => Some(triage),
            Some(Err(e)) => {
                tracing::warn!(model = %requested_model, error = %e, "Dropping malformed triage block");
                None
            }
            None => None,
        };

        Ok(ProviderReply {
            content,
            model_used: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| requested_model.to_string()),
            triage,
            estimates: self.estimates,
            collaboration: self.collaboration,
        })
    }
}

/// Errors from model providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AIError {
    /// Rate limited by the provider.
    #[error("rate limited by provider")]
    RateLimited {
        /// Seconds until retry is allowed, when the provider says.
        retry_after_secs: Option<u32>,
    },

    /// Account is out of credit.
    #[error("payment required: {0}")]
    PaymentRequired(String),

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider answered with no content.
    #[error("empty reply from {model}")]
    EmptyReply { model: String },

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AIError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        AIError::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        AIError::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        AIError::Parse(message.into())
    }

    /// Toast category for this failure.
    pub fn failure_category(&self) -> FailureCategory {
        match self {
            AIError::PaymentRequired(_) => FailureCategory::Payment,
            AIError::RateLimited { .. } => FailureCategory::RateLimit,
            _ => FailureCategory::Generic,
        }
    }
}
