//! The active conversation record for a chat session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatDomain, ConversationId, Identity, Timestamp};

/// One conversation, created on the first user message and ended on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// Identifier assigned by the conversation log, when logging succeeded.
    pub log_id: Option<ConversationId>,
    pub identity: Identity,
    pub domain: ChatDomain,
    pub started_at: Timestamp,
    pub message_count: u32,
    pub active: bool,
}

impl Conversation {
    pub fn start(identity: Identity, domain: ChatDomain, started_at: Timestamp) -> Self {
        Self {
            id: ConversationId::new(),
            log_id: None,
            identity,
            domain,
            started_at,
            message_count: 0,
            active: true,
        }
    }

    pub fn record_message(&mut self) {
        self.message_count += 1;
    }

    pub fn switch_domain(&mut self, domain: ChatDomain) {
        self.domain = domain;
    }

    pub fn end(&mut self) {
        self.active = false;
    }
}
