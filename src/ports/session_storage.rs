//! Session Storage Port - Interface for persisting session-scoped settings.
//!
//! Holds the `AIConfig` for one chat session so it survives a page reload
//! while the session lives. Cleared on reset.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::settings::AIConfig;

/// Errors that can occur during session storage operations
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SessionStorageError {
    #[error("Config not found for session: {0}")]
    NotFound(SessionId),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading session configuration
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Save the session's config, replacing any previous value
    ///
    /// # Errors
    /// Returns `SessionStorageError` if save fails
    async fn save_config(&self, session_id: SessionId, config: &AIConfig) -> Result<(), SessionStorageError>;

    /// Load the session's config
    ///
    /// # Errors
    /// Returns `SessionStorageError::NotFound` if nothing was saved
    async fn load_config(&self, session_id: SessionId) -> Result<AIConfig, SessionStorageError>;

    /// Remove the session's config
    async fn clear(&self, session_id: SessionId) -> Result<(), SessionStorageError>;
}
