//! Storage Adapters
//!
//! Implementations of the SessionStorage port for persisting session config.
//!
//! ## Available Adapters
//!
//! - **FileSessionStorage** - Stores config as YAML files on disk
//! - **InMemorySessionStorage** - Stores config in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionStorage, InMemorySessionStorage};
//!
//! // Durable across restarts
//! let storage = FileSessionStorage::new("./data/sessions");
//!
//! // Testing
//! let storage = InMemorySessionStorage::new();
//! ```

mod file_session_storage;
mod in_memory_session_storage;

pub use file_session_storage::FileSessionStorage;
pub use in_memory_session_storage::InMemorySessionStorage;
