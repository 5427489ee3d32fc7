//! File-based storage backend with atomic writes.
//!
//! Stores one file per key under `dirs::data_dir()/<namespace>/`.
//! Uses temp file + rename for atomic writes.

use crate::store::storage::KeyValueStorage;
use crate::OrderGateError;
use async_trait::async_trait;
use rand::RngCore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-based storage backend.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory for value files.
    dir: PathBuf,
}

impl FileStorage {
    /// Create file storage with the given namespace.
    ///
    /// Files are stored under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, OrderGateError> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            OrderGateError::StorageIO("Could not find data directory".to_string())
        })?;

        Self::with_path(base_dir.join(namespace))
    }

    /// Create file storage at a specific directory.
    pub fn with_path(dir: PathBuf) -> Result<Self, OrderGateError> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            OrderGateError::StorageIO(format!("Failed to create storage dir: {}", e))
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path for a key, rejecting names that could escape the directory.
    fn key_path(&self, key: &str) -> Result<PathBuf, OrderGateError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(OrderGateError::StorageIO(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, OrderGateError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OrderGateError::StorageIO(format!(
                "Failed to read {}: {}",
                key, e
            ))),
        }
    }

    /// Writes to a uniquely named temp file, then renames over the target.
    async fn set(&self, key: &str, value: &str) -> Result<(), OrderGateError> {
        let target_path = self.key_path(key)?;
        let temp_path = self
            .dir
            .join(format!("{}.{:016x}.tmp", key, rand::thread_rng().next_u64()));

        if let Err(e) = fs::write(&temp_path, value).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(OrderGateError::StorageIO(format!(
                "Failed to write temp file: {}",
                e
            )));
        }

        if let Err(e) = fs::rename(&temp_path, &target_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(OrderGateError::StorageIO(format!(
                "Failed to rename storage file: {}",
                e
            )));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), OrderGateError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OrderGateError::StorageIO(format!(
                "Failed to delete {}: {}",
                key, e
            ))),
        }
    }
}
