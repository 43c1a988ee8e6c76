//! EventPublisher port - Interface for publishing engine events.
//!
//! The engine publishes typed `ChatEvent`s without knowing who listens
//! (a terminal UI, a websocket bridge, a test).

use async_trait::async_trait;

use crate::domain::events::ChatEvent;

/// Port for publishing engine events.
///
/// Publishing is best-effort; the engine logs failures and carries on.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: ChatEvent) -> Result<(), EventPublishError>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum EventPublishError {
    #[error("event transport unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}
}
