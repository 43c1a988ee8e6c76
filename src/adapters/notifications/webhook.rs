//! Webhook notifier - POSTs each notification as JSON to a configured URL.
//!
//! The payload is the serialized `Notification` (tagged by `kind`). A
//! shared secret, when configured, is sent in the `X-Webhook-Secret` header.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::ports::{Notification, NotificationError, Notifier};

const SECRET_HEADER: &str = "X-Webhook-Secret";

pub struct WebhookNotifier {
    url: String,
    secret: Option<Secret<String>>,
    client: Client,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns `NotificationError::Delivery` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .build()
            .map_err(|e| NotificationError::Delivery(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            secret: None,
            client,
        })
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Secret::new(secret.into()));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.url).json(&notification);
        if let Some(secret) = &self.secret {
            request = request.header(SECRET_HEADER, secret.expose_secret().as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                kind = notification.kind(),
                status = status.as_u16(),
                "Webhook rejected notification"
            );
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(kind = notification.kind(), "Webhook notification delivered");
        Ok(())
    }
}
