//! File storage backend
//!
//! Each key is stored as `<base_path>/<key>.json`. Writes go to a temporary
//! sibling first and are renamed into place, so a crash mid-write leaves the
//! previous value intact rather than a truncated file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::storage::{validate_key, Storage};
use crate::error::{Result, StorageError};

pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file store rooted at `base_path`
    ///
    /// The directory is created lazily on the first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        match tokio::fs::read_to_string(self.file_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e).into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(StorageError::Io)?;

        let file_path = self.file_path(key);
        let tmp_path = self.base_path.join(format!(".{}.json.tmp", key));
        tokio::fs::write(&tmp_path, value)
            .await
            .map_err(StorageError::Io)?;

        // Slices may hold a session token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(StorageError::Io)?;
        }

        tokio::fs::rename(&tmp_path, &file_path)
            .await
            .map_err(StorageError::Io)?;

        tracing::trace!(key, path = %file_path.display(), "Wrote slice file");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.file_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));
        assert_eq!(storage.get_item("auth").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("nested").join("state");
        let storage = FileStorage::new(&base);

        storage.set_item("tab", "{\"activeTab\":\"explore\"}").await.unwrap();

        let on_disk = std::fs::read_to_string(base.join("tab.json")).unwrap();
        assert_eq!(on_disk, "{\"activeTab\":\"explore\"}");
        assert!(!base.join(".tab.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_overwrite_and_remove() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set_item("auth", "first").await.unwrap();
        storage.set_item("auth", "second").await.unwrap();
        assert_eq!(storage.get_item("auth").await.unwrap().as_deref(), Some("second"));

        storage.remove_item("auth").await.unwrap();
        assert_eq!(storage.get_item("auth").await.unwrap(), None);
        storage.remove_item("auth").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.set_item("../escape", "x").await.is_err());
        assert!(storage.get_item("../escape").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set_item("auth", "{}").await.unwrap();

        let mode = std::fs::metadata(dir.path().join("auth.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
