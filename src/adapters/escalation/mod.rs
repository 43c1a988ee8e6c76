//! Human escalation adapters.

mod in_memory;

pub use in_memory::InMemoryEscalationDesk;
