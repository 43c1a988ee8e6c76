//! PostgreSQL implementation of ConversationLog.
//!
//! Writes conversations and messages to the tables created by the
//! migrations in `migrations/`.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::path::Path;

use crate::domain::conversation::Message;
use crate::domain::foundation::{ChatDomain, ConversationId, Identity, Timestamp};
use crate::ports::{ConversationLog, ConversationLogError, ConversationStart};

/// PostgreSQL implementation of ConversationLog.
#[derive(Clone)]
pub struct PostgresConversationLog {
    pool: PgPool,
}

impl PostgresConversationLog {
    /// Creates a new PostgresConversationLog.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the SQL migrations found in `dir`.
    pub async fn migrate(&self, dir: impl AsRef<Path>) -> Result<(), ConversationLogError> {
        let migrator = Migrator::new(dir.as_ref())
            .await
            .map_err(|e| ConversationLogError::Database(format!("Failed to load migrations: {}", e)))?;
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| ConversationLogError::Database(format!("Failed to run migrations: {}", e)))
    }
}

impl std::fmt::Debug for PostgresConversationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConversationLog").finish_non_exhaustive()
    }
}

fn identity_columns(identity: &Identity) -> (&'static str, String) {
    match identity {
        Identity::Email(address) => ("email", address.clone()),
        Identity::Anonymous(ip) => ("anonymous", ip.to_string()),
    }
}

#[async_trait]
impl ConversationLog for PostgresConversationLog {
    async fn start_conversation(
        &self,
        start: ConversationStart,
    ) -> Result<ConversationId, ConversationLogError> {
        let id = ConversationId::new();
        let (kind, value) = identity_columns(&start.identity);

        sqlx::query(
            r#"
            INSERT INTO chat_conversations (
                id, identity_kind, identity_value, domain, ip_address, started_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(kind)
        .bind(value)
        .bind(start.domain.as_str())
        .bind(start.ip.map(|ip| ip.to_string()))
        .bind(*Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationLogError::Database(format!("Failed to insert conversation: {}", e)))?;

        Ok(id)
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        message: &Message,
    ) -> Result<(), ConversationLogError> {
        let metadata = message
            .metadata()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ConversationLogError::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            ConversationLogError::Database(format!("Failed to start transaction: {}", e))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE chat_conversations
            SET message_count = message_count + 1
            WHERE id = $1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| ConversationLogError::Database(format!("Failed to update conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ConversationLogError::NotFound(conversation_id));
        }

        sqlx::query(
            r#"
            INSERT INTO chat_messages (
                id, conversation_id, role, content, model, lane, metadata, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(conversation_id.as_uuid())
        .bind(message.role().as_str())
        .bind(message.content())
        .bind(message.model())
        .bind(message.lane().map(|l| l.as_str()))
        .bind(metadata)
        .bind(*message.timestamp().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| ConversationLogError::Database(format!("Failed to insert message: {}", e)))?;

        tx.commit().await.map_err(|e| {
            ConversationLogError::Database(format!("Failed to commit transaction: {}", e))
        })
    }

    async fn switch_domain(
        &self,
        conversation_id: ConversationId,
        domain: ChatDomain,
    ) -> Result<(), ConversationLogError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_conversations
            SET domain = $2
            WHERE id = $1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(domain.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationLogError::Database(format!("Failed to switch domain: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(ConversationLogError::NotFound(conversation_id));
        }
        Ok(())
    }

    async fn end_conversation(&self, conversation_id: ConversationId) -> Result<(), ConversationLogError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_conversations
            SET ended_at = $2
            WHERE id = $1 AND ended_at IS NULL
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(*Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| ConversationLogError::Database(format!("Failed to end conversation: {}", e)))?;

        if result.rows_affected() == 0 {
            tracing::debug!(%conversation_id, "Conversation already ended or missing");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_columns_split_kind_and_value() {
        let email = Identity::email("a@x.com").unwrap();
        assert_eq!(identity_columns(&email), ("email", "a@x.com".to_string()));

        let anon = Identity::anonymous("10.0.0.1").unwrap();
        assert_eq!(identity_columns(&anon), ("anonymous", "10.0.0.1".to_string()));
    }
}
