//! In-memory conversation log for testing and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::Message;
use crate::domain::foundation::{ChatDomain, ConversationId};
use crate::ports::{ConversationLog, ConversationLogError, ConversationStart};

#[derive(Debug, Clone)]
struct LoggedConversation {
    start: ConversationStart,
    domain: ChatDomain,
    messages: Vec<Message>,
    ended: bool,
}

/// Conversation log held in memory. Can be switched offline to exercise
/// degraded persistence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationLog {
    conversations: Arc<RwLock<HashMap<ConversationId, LoggedConversation>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a database error while `offline`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), ConversationLogError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ConversationLogError::Database("log offline".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn messages(&self, id: ConversationId) -> Vec<Message> {
        self.conversations
            .read()
            .await
            .get(&id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub async fn start_of(&self, id: ConversationId) -> Option<ConversationStart> {
        self.conversations.read().await.get(&id).map(|c| c.start.clone())
    }

    /// Current domain of a conversation, following any switches.
    pub async fn domain_of(&self, id: ConversationId) -> Option<ChatDomain> {
        self.conversations.read().await.get(&id).map(|c| c.domain)
    }

    pub async fn is_ended(&self, id: ConversationId) -> bool {
        self.conversations
            .read()
            .await
            .get(&id)
            .map(|c| c.ended)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ConversationLog for InMemoryConversationLog {
    async fn start_conversation(
        &self,
        start: ConversationStart,
    ) -> Result<ConversationId, ConversationLogError> {
        self.check_online()?;
        let id = ConversationId::new();
        self.conversations.write().await.insert(
            id,
            LoggedConversation {
                domain: start.domain,
                start,
                messages: Vec::new(),
                ended: false,
            },
        );
        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: &Message,
    ) -> Result<(), ConversationLogError> {
        self.check_online()?;
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or(ConversationLogError::NotFound(conversation_id))?;
        conversation.messages.push(message.clone());
        Ok(())
    }

    async fn switch_domain(
        &self,
        conversation_id: ConversationId,
        domain: ChatDomain,
    ) -> Result<(), ConversationLogError> {
        self.check_online()?;
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or(ConversationLogError::NotFound(conversation_id))?;
        conversation.domain = domain;
        Ok(())
    }

    async fn end_conversation(&self, conversation_id: ConversationId) -> Result<(), ConversationLogError> {
        self.check_online()?;
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or(ConversationLogError::NotFound(conversation_id))?;
        conversation.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Identity, Timestamp};

    fn start() -> ConversationStart {
        ConversationStart {
            identity: Identity::email("a@x.com").unwrap(),
            domain: ChatDomain::Technology,
            ip: None,
        }
    }

    #[tokio::test]
    async fn logs_messages_in_order() {
        let log = InMemoryConversationLog::new();
        let id = log.start_conversation(start()).await.unwrap();

        log.append_message(id, &Message::user("q", Timestamp::now())).await.unwrap();
        log.append_message(id, &Message::assistant("a", Timestamp::now())).await.unwrap();

        let contents: Vec<_> = log.messages(id).await.iter().map(|m| m.content().to_string()).collect();
        assert_eq!(contents, vec!["q", "a"]);
    }

    #[tokio::test]
    async fn appending_to_unknown_conversation_fails() {
        let log = InMemoryConversationLog::new();
        let id = ConversationId::new();
        let err = log
            .append_message(id, &Message::user("q", Timestamp::now()))
            .await
            .unwrap_err();
        assert_eq!(err, ConversationLogError::NotFound(id));
    }

    #[tokio::test]
    async fn offline_log_rejects_writes() {
        let log = InMemoryConversationLog::new();
        log.set_offline(true);
        assert!(log.start_conversation(start()).await.is_err());
        assert_eq!(log.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn end_marks_conversation_ended() {
        let log = InMemoryConversationLog::new();
        let id = log.start_conversation(start()).await.unwrap();
        log.end_conversation(id).await.unwrap();
        assert!(log.is_ended(id).await);
    }

    #[tokio::test]
    async fn switch_domain_keeps_the_starting_domain_in_start() {
        let log = InMemoryConversationLog::new();
        let id = log.start_conversation(start()).await.unwrap();

        log.switch_domain(id, ChatDomain::Healthcare).await.unwrap();

        assert_eq!(log.domain_of(id).await, Some(ChatDomain::Healthcare));
        assert_eq!(log.start_of(id).await.unwrap().domain, ChatDomain::Technology);
    }

    #[tokio::test]
    async fn switch_domain_on_unknown_conversation_fails() {
        let log = InMemoryConversationLog::new();
        let id = ConversationId::new();
        let err = log.switch_domain(id, ChatDomain::Healthcare).await.unwrap_err();
        assert_eq!(err, ConversationLogError::NotFound(id));
    }
}
