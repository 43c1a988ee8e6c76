//! File-based Session Storage Adapter
//!
//! Stores each session's config as a YAML file named after the session.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SessionId;
use crate::domain::settings::AIConfig;
use crate::ports::{SessionStorage, SessionStorageError};

/// File-based storage for session configs
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    base_path: PathBuf,
}

impl FileSessionStorage {
    /// Create a new file storage with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileSessionStorage::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn config_path(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", session_id))
    }

    async fn ensure_dir(&self) -> Result<(), SessionStorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStorageError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn save_config(&self, session_id: SessionId, config: &AIConfig) -> Result<(), SessionStorageError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(config)
            .map_err(|e| SessionStorageError::SerializationFailed(e.to_string()))?;

        fs::write(self.config_path(session_id), yaml)
            .await
            .map_err(|e| SessionStorageError::IoError(e.to_string()))
    }

    async fn load_config(&self, session_id: SessionId) -> Result<AIConfig, SessionStorageError> {
        let yaml = match fs::read_to_string(self.config_path(session_id)).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionStorageError::NotFound(session_id))
            }
            Err(e) => return Err(SessionStorageError::IoError(e.to_string())),
        };

        serde_yaml::from_str(&yaml).map_err(|e| SessionStorageError::DeserializationFailed(e.to_string()))
    }

    async fn clear(&self, session_id: SessionId) -> Result<(), SessionStorageError> {
        match fs::remove_file(self.config_path(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStorageError::IoError(e.to_string())),
        }
    }
}
