//! Session config storage

use serde::Deserialize;
use std::path::PathBuf;

/// Where session configs are kept. In memory when `session_dir` is unset.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub session_dir: Option<PathBuf>,
}
