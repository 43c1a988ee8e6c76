//! Notifier that only logs. Used when no webhook is configured.

use async_trait::async_trait;

use crate::domain::foundation::redact_email;
use crate::ports::{Notification, NotificationError, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        match &notification {
            Notification::Welcome { email } => {
                tracing::info!(kind = "welcome", recipient = %redact_email(email), "notification");
            }
            Notification::Transcript {
                email,
                domain,
                messages,
            } => {
                tracing::info!(
                    kind = "transcript",
                    recipient = %redact_email(email),
                    domain = %domain,
                    messages = messages.len(),
                    "notification"
                );
            }
        }
        Ok(())
    }
}
