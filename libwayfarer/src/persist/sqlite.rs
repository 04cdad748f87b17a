//! SQLite storage backend

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use super::storage::{validate_key, Storage};
use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        // The slices table lives in its own file, created on first open
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StorageError::Migration)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let row = sqlx::query(
            r#"
            SELECT value FROM slices WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO slices (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        sqlx::query(
            r#"
            DELETE FROM slices WHERE key = ?
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    fn backend_name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> SqliteStorage {
        let path = dir.path().join("state.db");
        SqliteStorage::new(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_read() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir).await;

        assert_eq!(storage.get_item("auth").await.unwrap(), None);
        storage.set_item("auth", "{\"msg\":\"a\"}").await.unwrap();
        storage.set_item("auth", "{\"msg\":\"b\"}").await.unwrap();
        assert_eq!(
            storage.get_item("auth").await.unwrap().as_deref(),
            Some("{\"msg\":\"b\"}")
        );
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir).await;

        storage.set_item("tab", "{}").await.unwrap();
        storage.remove_item("tab").await.unwrap();
        storage.remove_item("tab").await.unwrap();
        assert_eq!(storage.get_item("tab").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage = open(&dir).await;
            storage.set_item("tab", "{\"activeTab\":\"group\"}").await.unwrap();
        }

        let storage = open(&dir).await;
        assert_eq!(
            storage.get_item("tab").await.unwrap().as_deref(),
            Some("{\"activeTab\":\"group\"}")
        );
        assert_eq!(storage.backend_name(), "sqlite");
    }
}
