//! Event publisher that writes events to the tracing pipeline.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::events::ChatEvent;
use crate::domain::foundation::Identity;
use crate::ports::{EventPublisher, EventPublishError};

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: ChatEvent) -> Result<(), EventPublishError> {
        let payload = log_payload(&event).map_err(|e| EventPublishError::Unavailable(e.to_string()))?;
        tracing::info!(event_type = event.event_type(), payload = %payload, "chat event");
        Ok(())
    }
}

/// JSON for the log line, with every `identity` field redacted.
fn log_payload(event: &ChatEvent) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(event)?;
    scrub_identities(&mut value);
    serde_json::to_string(&value)
}

fn scrub_identities(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key == "identity" {
                    if let Ok(identity) = serde_json::from_value::<Identity>(field.clone()) {
                        *field = Value::String(identity.redacted());
                        continue;
                    }
                }
                scrub_identities(field);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub_identities),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::rate_limit::{RateLimits, UsageCounter};

    #[test]
    fn rate_limited_payload_never_carries_the_raw_email() {
        let identity = Identity::email("alice@example.com").unwrap();
        let now = Timestamp::from_unix_secs(1_705_312_800);
        let window = UsageCounter::restore(now, 2, 2).window(&identity, RateLimits::new(2, 100));
        let event = ChatEvent::RateLimited {
            identity,
            window: Some(window),
            retry_after_secs: 60,
        };

        let payload = log_payload(&event).unwrap();

        assert!(!payload.contains("alice"));
        assert!(payload.contains("a***@example.com"));
    }

    #[tokio::test]
    async fn publish_always_succeeds_for_serializable_events() {
        let publisher = TracingEventPublisher::new();
        let event = ChatEvent::PersistenceDegraded {
            operation: "start_conversation".into(),
            reason: "offline".into(),
        };
        assert!(publisher.publish(event).await.is_ok());
    }
}
