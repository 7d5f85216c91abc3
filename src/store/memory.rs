//! In-memory `ContextStore`, for tests and single-process use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::traits::ContextStore;

#[derive(Debug, Default)]
pub struct MemoryContextStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut guard = self.entries.write().await;
        for (key, value) in entries {
            guard.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.write().await.remove(key))
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
