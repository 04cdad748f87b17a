//! Durable key/value storage abstraction
//!
//! Persisted slices are stored one entry per slice, keyed by slice name. The
//! [`Storage`] trait is the seam between the persistence adapter and the
//! backends:
//!
//! - `MemoryStorage`: process memory, for tests and ephemeral sessions
//! - `FileStorage`: one JSON file per key (see `file.rs`)
//! - `SqliteStorage`: a single SQLite table (see `sqlite.rs`)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, StorageError};

/// Common interface for all storage backends
///
/// Values are opaque strings; the persistence adapter decides their format.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Name of the backend, for logs and diagnostics
    fn backend_name(&self) -> &str;
}

/// Keys become file names, so they are limited to a safe alphabet
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()).into())
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.entries().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
