//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the clock abstraction and error
//! types that form the vocabulary of the chat domain.

mod chat_domain;
mod clock;
mod errors;
mod identity;
mod ids;
mod timestamp;

pub use chat_domain::ChatDomain;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::ValidationError;
pub use identity::{redact_email, Identity};
pub use ids::{ConversationId, MessageId, RateLimitSessionId, SessionId, TicketId, TurnId};
pub use timestamp::Timestamp;
