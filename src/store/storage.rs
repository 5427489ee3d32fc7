//! Durable key/value storage abstraction.

use crate::OrderGateError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Async string key/value storage.
///
/// `set` must replace the value atomically: a reader sees either the old
/// value or the new one, never a partial write.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, OrderGateError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), OrderGateError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), OrderGateError>;
}

/// In-process storage, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, OrderGateError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), OrderGateError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), OrderGateError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
