//! EscalationDesk port - hand a conversation to a human.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::Message;
use crate::domain::foundation::{Identity, TicketId, Timestamp};
use crate::domain::rate_limit::RateLimitWindow;

#[async_trait]
pub trait EscalationDesk: Send + Sync {
    /// Files a support ticket with the recent transcript attached.
    async fn submit(&self, ticket: EscalationTicket) -> Result<TicketAck, EscalationError>;

    /// Asks for a higher quota after the visitor hit a limit.
    async fn request_extended_access(
        &self,
        request: AccessRequest,
    ) -> Result<TicketAck, EscalationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationTicket {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub transcript: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub identity: Identity,
    pub reason: String,
    pub window: Option<RateLimitWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAck {
    pub ticket_id: TicketId,
    pub submitted_at: Timestamp,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum EscalationError {
    #[error("escalation desk unavailable: {0}")]
    Unavailable(String),

    #[error("invalid escalation: {0}")]
    Invalid(String),
}
