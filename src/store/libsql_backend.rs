//! libSQL backend — persistent `ContextStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::ContextStore;

/// libSQL staged-context store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlContextStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlContextStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&store.conn).await?;
        info!(path = %path.display(), "Staged context store opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&store.conn).await?;
        Ok(store)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl ContextStore for LibSqlContextStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO staged_context (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set: {e}")))?;
        debug!(key, "Staged context written");
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| StoreError::Query(format!("set_many: {e}")))?;

        // Dropping `tx` on an early return rolls every upsert back.
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO staged_context (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![*key, value.as_str(), now.as_str()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set_many: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Query(format!("set_many: {e}")))?;
        debug!(count = entries.len(), "Staged context written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT value FROM staged_context WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map(Some)
                .map_err(|e| StoreError::Query(format!("get: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "DELETE FROM staged_context WHERE key = ?1 RETURNING value",
                params![key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("take: {e}")))?;

        let value = match rows.next().await {
            Ok(Some(row)) => Some(
                row.get::<String>(0)
                    .map_err(|e| StoreError::Query(format!("take: {e}")))?,
            ),
            Ok(None) => None,
            Err(e) => return Err(StoreError::Query(format!("take: {e}"))),
        };
        if value.is_some() {
            debug!(key, "Staged context consumed");
        }
        Ok(value)
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let count = self
            .conn()
            .execute("DELETE FROM staged_context WHERE key = ?1", params![key])
            .await
            .map_err(|e| StoreError::Query(format!("remove: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> LibSqlContextStore {
        LibSqlContextStore::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn staged_context_crud() {
        let store = test_store().await;

        store.set("selected_building", r#"{"id":"b1"}"#).await.unwrap();
        assert_eq!(
            store.get("selected_building").await.unwrap().as_deref(),
            Some(r#"{"id":"b1"}"#)
        );

        // Upsert
        store.set("selected_building", r#"{"id":"b2"}"#).await.unwrap();
        assert_eq!(
            store.get("selected_building").await.unwrap().as_deref(),
            Some(r#"{"id":"b2"}"#)
        );

        assert!(store.remove("selected_building").await.unwrap());
        assert!(store.get("selected_building").await.unwrap().is_none());
        assert!(!store.remove("selected_building").await.unwrap());
    }

    #[tokio::test]
    async fn take_is_read_once() {
        let store = test_store().await;
        store.set("client_id", "cl_1").await.unwrap();

        assert_eq!(store.take("client_id").await.unwrap().as_deref(), Some("cl_1"));
        assert!(store.take("client_id").await.unwrap().is_none());
        assert!(store.get("client_id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_many_replaces_previous_pair() {
        let store = test_store().await;
        store
            .set_many(&[("client_id", "cl_old".to_string()), ("selected_building", r#"{"id":"b_old"}"#.to_string())])
            .await
            .unwrap();
        store
            .set_many(&[("client_id", "cl_new".to_string()), ("selected_building", r#"{"id":"b_new"}"#.to_string())])
            .await
            .unwrap();

        assert_eq!(store.get("client_id").await.unwrap().as_deref(), Some("cl_new"));
        assert_eq!(
            store.get("selected_building").await.unwrap().as_deref(),
            Some(r#"{"id":"b_new"}"#)
        );
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let store = test_store().await;
        assert!(store.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ctx.db");

        {
            let store = LibSqlContextStore::new_local(&path).await.unwrap();
            store.set("client_id", "cl_9").await.unwrap();
        }

        let reopened = LibSqlContextStore::new_local(&path).await.unwrap();
        assert_eq!(reopened.take("client_id").await.unwrap().as_deref(), Some("cl_9"));
    }
}
