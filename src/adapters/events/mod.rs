//! Event publisher adapters.
//!
//! - `InMemoryEventBus` - records events and fans them out to subscribers
//! - `TracingEventPublisher` - writes events as structured log records

mod in_memory;
mod tracing_publisher;

pub use in_memory::InMemoryEventBus;
pub use tracing_publisher::TracingEventPublisher;
