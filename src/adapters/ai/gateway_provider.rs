//! Gateway Provider - ModelProvider over the HTTP model gateway.
//!
//! The gateway fronts every vendor behind one JSON endpoint. The request
//! carries the provider tag and model; the reply carries content plus
//! optional triage, estimates and collaboration blocks.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GatewayConfig::new("https://gateway.example.com/v1")
//!     .with_api_key(api_key);
//!
//! let provider = GatewayModelProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};

use crate::ports::{AIError, ModelProvider, ModelRequest, ProviderReply, RawProviderReply};

/// Configuration for the gateway provider.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bearer token, when the gateway requires one.
    api_key: Option<Secret<String>>,
    /// Base URL, without the trailing `/chat`.
    pub base_url: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// HTTP gateway implementation of the ModelProvider port.
///
/// No client timeout and no retries: a slow provider keeps its lane in the
/// thinking state until it answers or fails.
pub struct GatewayModelProvider {
    config: GatewayConfig,
    client: Client,
}

impl GatewayModelProvider {
    /// Creates the provider.
    ///
    /// # Errors
    ///
    /// Returns `AIError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_request(&self, request: &ModelRequest) -> Result<Response, AIError> {
        let mut builder = self.client.post(self.chat_url()).json(request);
        if let Some(key) = self.config.api_key() {
            builder = builder.bearer_auth(key);
        }
        builder.send().await.map_err(|e| {
            if e.is_connect() {
                AIError::network(format!("Connection failed: {}", e))
            } else {
                AIError::network(e.to_string())
            }
        })
    }

    /// Maps a non-success status to an error.
    fn status_error(status: StatusCode, body: String, retry_after_secs: Option<u32>) -> AIError {
        match status.as_u16() {
            401 | 403 => AIError::AuthenticationFailed,
            402 => AIError::PaymentRequired(body),
            429 => AIError::RateLimited { retry_after_secs },
            400 | 422 => AIError::InvalidRequest(body),
            500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
            _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
        }
    }

    async fn parse_response(response: Response, model: &str) -> Result<ProviderReply, AIError> {
        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body, retry_after));
        }

        let raw: RawProviderReply = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;
        raw.validate(model)
    }
}

impl std::fmt::Debug for GatewayModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayModelProvider")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelProvider for GatewayModelProvider {
    async fn complete(&self, request: ModelRequest) -> Result<ProviderReply, AIError> {
        let model = request.model.clone();
        tracing::debug!(
            provider = %request.provider,
            model = %model,
            history = request.history.len(),
            auto_route = request.auto_route,
            "Sending gateway request"
        );

        let response = self.send_request(&request).await?;
        let result = Self::parse_response(response, &model).await;

        if let Err(ref e) = result {
            tracing::warn!(model = %model, error = %e, "Gateway request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::FailureCategory;

    #[test]
    fn chat_url_strips_trailing_slash() {
        let provider = GatewayModelProvider::new(GatewayConfig::new("http://localhost:8080/v1/")).unwrap();
        assert_eq!(provider.chat_url(), "http://localhost:8080/v1/chat");
    }

    #[test]
    fn api_key_is_optional() {
        let config = GatewayConfig::new("http://x");
        assert!(config.api_key().is_none());
        let config = config.with_api_key("sk-test");
        assert_eq!(config.api_key(), Some("sk-test"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = GatewayConfig::new("http://x").with_api_key("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn payment_status_maps_to_payment_category() {
        let err = GatewayModelProvider::status_error(StatusCode::PAYMENT_REQUIRED, "no credit".into(), None);
        assert_eq!(err.failure_category(), FailureCategory::Payment);
    }

    #[test]
    fn too_many_requests_keeps_retry_after() {
        let err = GatewayModelProvider::status_error(StatusCode::TOO_MANY_REQUESTS, String::new(), Some(12));
        assert_eq!(err, AIError::RateLimited { retry_after_secs: Some(12) });
    }

    #[test]
    fn server_errors_are_unavailable() {
        let err = GatewayModelProvider::status_error(StatusCode::BAD_GATEWAY, "upstream".into(), None);
        assert!(matches!(err, AIError::Unavailable { .. }));
    }

    #[test]
    fn auth_failures_map_to_authentication_failed() {
        assert_eq!(
            GatewayModelProvider::status_error(StatusCode::UNAUTHORIZED, String::new(), None),
            AIError::AuthenticationFailed
        );
    }
}
