//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! - `ModelProvider` - LLM gateway completions
//! - `RateLimitService` - Shared hourly/daily quota store
//! - `ConversationLog` - Durable conversation and message log
//! - `Notifier` - Welcome and transcript notifications
//! - `EscalationDesk` - Human escalation and extended-access requests
//! - `SessionStorage` - Session-scoped config persistence
//! - `EventPublisher` - Typed engine events

mod conversation_log;
mod escalation;
mod event_publisher;
mod model_provider;
mod notifier;
mod rate_limit_service;
mod session_storage;

pub use conversation_log::{ConversationLog, ConversationLogError, ConversationStart};
pub use escalation::{AccessRequest, EscalationDesk, EscalationError, EscalationTicket, TicketAck};
pub use event_publisher::{EventPublishError, EventPublisher};
pub use model_provider::{
    AIError, HistoryMessage, ImageAttachment, ModelProvider, ModelRequest, ProviderReply,
    RawProviderReply, RawTriage, RequestMetadata,
};
pub use notifier::{Notification, NotificationError, Notifier};
pub use rate_limit_service::{MessageCountUpdate, RateLimitError, RateLimitService, StartedConversation};
pub use session_storage::{SessionStorage, SessionStorageError};
