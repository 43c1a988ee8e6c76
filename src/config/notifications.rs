//! Outbound notification configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Welcome/transcript delivery. Notifications are only logged when no
/// webhook is configured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationsConfig {
    pub webhook_url: Option<String>,

    /// Sent as `X-Webhook-Secret`
    pub webhook_secret: Option<String>,
}

impl NotificationsConfig {
    pub fn has_webhook(&self) -> bool {
        self.webhook_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidWebhookUrl);
            }
        }
        Ok(())
    }
}
