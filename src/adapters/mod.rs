//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `ai` - Model providers (HTTP gateway, mock)
//! - `conversation_log` - Conversation log (in-memory, PostgreSQL)
//! - `escalation` - Human escalation desk
//! - `events` - Event publishers (in-memory bus, tracing)
//! - `notifications` - Welcome/transcript notifiers (log, webhook)
//! - `rate_limiter` - Quota services (in-memory, Redis)
//! - `storage` - Session config storage (in-memory, YAML files)

pub mod ai;
pub mod conversation_log;
pub mod escalation;
pub mod events;
pub mod notifications;
pub mod rate_limiter;
pub mod storage;

pub use ai::{GatewayConfig, GatewayModelProvider, MockError, MockModelProvider, MockReply};
pub use conversation_log::{InMemoryConversationLog, PostgresConversationLog};
pub use escalation::InMemoryEscalationDesk;
pub use events::{InMemoryEventBus, TracingEventPublisher};
pub use notifications::{LoggingNotifier, WebhookNotifier};
pub use rate_limiter::{InMemoryRateLimitService, RedisRateLimitService};
pub use storage::{FileSessionStorage, InMemorySessionStorage};
