//! Conversation log adapters.
//!
//! - `InMemoryConversationLog` - testing and offline runs
//! - `PostgresConversationLog` - sqlx over PostgreSQL

mod in_memory;
mod postgres;

pub use in_memory::InMemoryConversationLog;
pub use postgres::PostgresConversationLog;
