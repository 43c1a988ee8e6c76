//! In-memory event bus.
//!
//! Records every published event for assertions and fans it out to
//! live subscribers over a tokio broadcast channel.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::domain::events::ChatEvent;
use crate::ports::{EventPublisher, EventPublishError};

const DEFAULT_CAPACITY: usize = 256;

/// In-memory event bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let mut rx = bus.subscribe();
///
/// bus.publish(event).await?;
///
/// assert_eq!(bus.event_count(), 1);
/// assert!(bus.has_event("chat.turn_completed.v1"));
/// ```
pub struct InMemoryEventBus {
    published: RwLock<Vec<ChatEvent>>,
    sender: broadcast::Sender<ChatEvent>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Bus whose subscribers lag after `capacity` unread events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            published: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }

    // === Test Helpers ===

    pub fn published_events(&self) -> Vec<ChatEvent> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<ChatEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.event_type() == event_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("events", &self.event_count())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ChatEvent) -> Result<(), EventPublishError> {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());

        // No receivers is not an error; the event is still recorded.
        let _ = self.sender.send(event);
        Ok(())
    }
}
