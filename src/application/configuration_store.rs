//! ConfigurationStore - the session's `AIConfig` and its persistence.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::settings::{AIConfig, AIConfigPatch, ConfigNotice};
use crate::ports::{SessionStorage, SessionStorageError};

/// Result of `ConfigurationStore::update`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub config: AIConfig,
    /// Split-screen lanes must be emptied by the caller.
    pub lanes_cleared: bool,
    pub notices: Vec<ConfigNotice>,
}

/// Owns one session's `AIConfig`. The only way to change it is `update`.
pub struct ConfigurationStore {
    session_id: SessionId,
    config: AIConfig,
    defaults: AIConfig,
    storage: Arc<dyn SessionStorage>,
}

impl ConfigurationStore {
    pub fn new(session_id: SessionId, defaults: AIConfig, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            session_id,
            config: defaults.clone(),
            defaults,
            storage,
        }
    }

    /// Restores a previously saved config for `session_id`, falling back to
    /// `defaults` when none is stored or it cannot be read.
    pub async fn restore(
        session_id: SessionId,
        defaults: AIConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let mut store = Self::new(session_id, defaults, storage);
        match store.storage.load_config(session_id).await {
            Ok(config) => store.config = config,
            Err(SessionStorageError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to restore session config, using defaults");
            }
        }
        store
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Applies `patch` and persists the result.
    ///
    /// A storage failure is logged; the in-memory config still changes.
    pub async fn update(&mut self, patch: AIConfigPatch) -> ConfigUpdate {
        let change = self.config.apply(patch);

        if let Err(e) = self.storage.save_config(self.session_id, &self.config).await {
            tracing::warn!(session_id = %self.session_id, error = %e, "Failed to persist session config");
        }

        ConfigUpdate {
            config: self.config.clone(),
            lanes_cleared: change.lanes_cleared,
            notices: change.notices,
        }
    }

    /// Back to defaults; the stored copy is removed.
    pub async fn reset(&mut self) {
        self.config = self.defaults.clone();
        if let Err(e) = self.storage.clear(self.session_id).await {
            tracing::warn!(session_id = %self.session_id, error = %e, "Failed to clear session config");
        }
    }
}

impl std::fmt::Debug for ConfigurationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationStore")
            .field("session_id", &self.session_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySessionStorage;
    use crate::domain::settings::ChatMode;

    fn store_with(storage: Arc<InMemorySessionStorage>) -> ConfigurationStore {
        ConfigurationStore::new(SessionId::new(), AIConfig::default(), storage)
    }

    #[tokio::test]
    async fn update_persists_new_config() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let mut store = store_with(storage.clone());

        let update = store.update(AIConfigPatch::mode(ChatMode::Multi)).await;

        assert_eq!(update.config.mode, ChatMode::Multi);
        let saved = storage.load_config(store.session_id()).await.unwrap();
        assert_eq!(saved.mode, ChatMode::Multi);
    }

    #[tokio::test]
    async fn leaving_multi_mode_clears_lanes() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let mut store = store_with(storage);
        store.update(AIConfigPatch::mode(ChatMode::Multi)).await;
        store.update(AIConfigPatch::split_screen(true)).await;

        let update = store.update(AIConfigPatch::mode(ChatMode::Single)).await;

        assert!(update.lanes_cleared);
        assert!(!update.notices.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_still_applies_in_memory() {
        let storage = Arc::new(InMemorySessionStorage::new());
        storage.fail_writes(true);
        let mut store = store_with(storage.clone());

        let update = store.update(AIConfigPatch::split_screen(true)).await;

        assert!(update.config.split_screen);
        assert!(store.config().split_screen);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn restore_reads_saved_config() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let session_id = SessionId::new();
        let mut saved = AIConfig::default();
        saved.mode = ChatMode::Single;
        storage.save_config(session_id, &saved).await.unwrap();

        let store = ConfigurationStore::restore(session_id, AIConfig::default(), storage).await;

        assert_eq!(store.config().mode, ChatMode::Single);
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_clears_storage() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let mut store = store_with(storage.clone());
        store.update(AIConfigPatch::mode(ChatMode::Multi)).await;

        store.reset().await;

        assert_eq!(store.config(), &AIConfig::default());
        assert!(storage.is_empty().await);
    }
}
