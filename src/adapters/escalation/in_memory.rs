//! In-memory escalation desk. Keeps submitted tickets and access
//! requests so they can be inspected.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{TicketId, Timestamp};
use crate::ports::{AccessRequest, EscalationDesk, EscalationError, EscalationTicket, TicketAck};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEscalationDesk {
    tickets: Arc<RwLock<Vec<(TicketAck, EscalationTicket)>>>,
    access_requests: Arc<RwLock<Vec<(TicketAck, AccessRequest)>>>,
}

impl InMemoryEscalationDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tickets(&self) -> Vec<EscalationTicket> {
        self.tickets.read().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn access_requests(&self) -> Vec<AccessRequest> {
        self.access_requests
            .read()
            .await
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn acknowledge() -> TicketAck {
        TicketAck {
            ticket_id: TicketId::new(),
            submitted_at: Timestamp::now(),
        }
    }
}

#[async_trait]
impl EscalationDesk for InMemoryEscalationDesk {
    async fn submit(&self, ticket: EscalationTicket) -> Result<TicketAck, EscalationError> {
        if ticket.email.trim().is_empty() || !ticket.email.contains('@') {
            return Err(EscalationError::Invalid("a contact email is required".into()));
        }
        if ticket.message.trim().is_empty() {
            return Err(EscalationError::Invalid("message cannot be empty".into()));
        }

        let ack = Self::acknowledge();
        tracing::info!(ticket_id = %ack.ticket_id, subject = %ticket.subject, "Escalation ticket submitted");
        self.tickets.write().await.push((ack.clone(), ticket));
        Ok(ack)
    }

    async fn request_extended_access(
        &self,
        request: AccessRequest,
    ) -> Result<TicketAck, EscalationError> {
        let ack = Self::acknowledge();
        tracing::info!(ticket_id = %ack.ticket_id, identity = %request.identity.redacted(), "Extended access requested");
        self.access_requests.write().await.push((ack.clone(), request));
        Ok(ack)
    }
}
