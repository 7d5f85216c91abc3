//! `ContextStore` trait — key/value storage for context staged between screens.

use async_trait::async_trait;

use crate::error::StoreError;

/// Process-wide key → string store that survives navigation.
///
/// Values are written right before a navigation and read once by the
/// destination screen; nothing relies on them beyond the current session.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several values as one unit: either all land or none do.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Read a value without consuming it.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Read a value and remove it.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove a value. Returns whether one existed.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}
