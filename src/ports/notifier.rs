//! Notifier port - outbound email-style notifications.
//!
//! Notifications are fire-and-forget: the engine spawns them and reports
//! failures as events instead of failing the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::Message;
use crate::domain::foundation::ChatDomain;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Sent once the visitor accepts the privacy notice with an email.
    Welcome { email: String },
    /// Conversation transcript, sent when a conversation with a known email
    /// is reset.
    Transcript {
        email: String,
        domain: ChatDomain,
        messages: Vec<Message>,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Welcome { .. } => "welcome",
            Notification::Transcript { .. } => "transcript",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::Welcome { email } | Notification::Transcript { email, .. } => email,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("notification rejected with status {status}")]
    Rejected { status: u16 },
}
