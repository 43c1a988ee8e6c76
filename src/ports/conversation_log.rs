//! ConversationLog port - durable record of conversations and messages.

use async_trait::async_trait;
use std::net::IpAddr;

use crate::domain::conversation::Message;
use crate::domain::foundation::{ChatDomain, ConversationId, Identity};

/// Port for the relational conversation log.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// Creates a conversation row and returns its identifier.
    async fn start_conversation(
        &self,
        start: ConversationStart,
    ) -> Result<ConversationId, ConversationLogError>;

    /// Appends one message to an existing conversation.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: &Message,
    ) -> Result<(), ConversationLogError>;

    /// Records the domain a live conversation moved to. The row keeps only
    /// the latest domain.
    async fn switch_domain(
        &self,
        conversation_id: ConversationId,
        domain: ChatDomain,
    ) -> Result<(), ConversationLogError>;

    /// Marks a conversation as ended.
    async fn end_conversation(&self, conversation_id: ConversationId) -> Result<(), ConversationLogError>;
}

/// Data needed to open a conversation row.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationStart {
    pub identity: Identity,
    pub domain: ChatDomain,
    pub ip: Option<IpAddr>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConversationLogError {
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ConversationLog) {}

    #[test]
    fn not_found_includes_id() {
        let id = ConversationId::new();
        assert!(ConversationLogError::NotFound(id).to_string().contains(&id.to_string()));
    }
}
