//! In-memory Session Storage Adapter
//!
//! Keeps session configs in a HashMap. Writes can be made to fail for
//! exercising degraded-persistence paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::settings::AIConfig;
use crate::ports::{SessionStorage, SessionStorageError};

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStorage {
    configs: Arc<RwLock<HashMap<SessionId, AIConfig>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail with an IO error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.configs.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save_config(&self, session_id: SessionId, config: &AIConfig) -> Result<(), SessionStorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SessionStorageError::IoError("storage offline".to_string()));
        }
        self.configs.write().await.insert(session_id, config.clone());
        Ok(())
    }

    async fn load_config(&self, session_id: SessionId) -> Result<AIConfig, SessionStorageError> {
        self.configs
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(SessionStorageError::NotFound(session_id))
    }

    async fn clear(&self, session_id: SessionId) -> Result<(), SessionStorageError> {
        self.configs.write().await.remove(&session_id);
        Ok(())
    }
}
