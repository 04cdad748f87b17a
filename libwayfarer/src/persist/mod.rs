//! Slice persistence
//!
//! Persistence is a decorator around a slice reducer, kept apart from the
//! pure reducer logic:
//!
//! - on startup, [`Persisted::rehydrate`] reads the slice's stored value and
//!   overlays it on the slice default
//! - after a transition, [`Persisted::after_transition`] turns a changed slice
//!   into a [`PendingWrite`], which the store hands to the [`PersistWriter`]
//!
//! A slice may opt into partial persistence with a whitelist of serialized
//! field names. Only those fields are written, and only those fields are
//! taken back on rehydration.

pub mod file;
pub mod sqlite;
pub mod storage;
pub mod writer;

pub use file::FileStorage;
pub use sqlite::SqliteStorage;
pub use storage::{MemoryStorage, Storage};
pub use writer::PersistWriter;

use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::{SlicePersistConfig, StorageBackend, StorageConfig};
use crate::error::{ConfigError, Result, StorageError};
use crate::store::reducer::Slice;

/// A serialized slice waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// Slice name, used as the storage key
    pub key: &'static str,
    /// Serialized (whitelisted) slice value
    pub value: String,
}

/// Persistence adapter for one slice
#[derive(Debug, Clone)]
pub struct Persisted<S: Slice> {
    enabled: bool,
    whitelist: Option<Vec<String>>,
    _slice: PhantomData<S>,
}

fn slice_fields<S: Slice>() -> std::result::Result<Map<String, Value>, StorageError> {
    match serde_json::to_value(S::State::default())? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

impl<S: Slice> Persisted<S> {
    /// Build the adapter, checking the whitelist against the slice's fields
    pub fn new(config: &SlicePersistConfig) -> Result<Self> {
        if let Some(whitelist) = &config.whitelist {
            let fields = slice_fields::<S>()?;
            if let Some(unknown) = whitelist.iter().find(|f| !fields.contains_key(f.as_str())) {
                return Err(ConfigError::UnknownWhitelistField {
                    slice: S::KEY.to_string(),
                    field: unknown.clone(),
                }
                .into());
            }
        }

        Ok(Self {
            enabled: config.enabled,
            whitelist: config.whitelist.clone(),
            _slice: PhantomData,
        })
    }

    /// Adapter that neither reads nor writes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            whitelist: None,
            _slice: PhantomData,
        }
    }

    /// Storage key for this slice
    pub fn key(&self) -> &'static str {
        S::KEY
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn keeps(&self, field: &str) -> bool {
        match &self.whitelist {
            Some(whitelist) => whitelist.iter().any(|f| f == field),
            None => true,
        }
    }

    /// The persisted view of `state`: the whole slice, or its whitelisted fields
    pub fn project(&self, state: &S::State) -> std::result::Result<Value, StorageError> {
        match serde_json::to_value(state)? {
            Value::Object(mut map) => {
                map.retain(|field, _| self.keeps(field));
                Ok(Value::Object(map))
            }
            other => Ok(other),
        }
    }

    /// Write needed after `prev` became `next`, if any
    ///
    /// Returns `None` when persistence is off or nothing persisted changed.
    pub fn after_transition(&self, prev: &S::State, next: &S::State) -> Option<PendingWrite> {
        if !self.enabled || prev == next {
            return None;
        }

        let projected = match (self.project(prev), self.project(next)) {
            (Ok(before), Ok(after)) if before == after => return None,
            (_, Ok(after)) => after,
            (_, Err(e)) => {
                tracing::warn!(slice = S::KEY, error = %e, "Failed to serialize slice");
                return None;
            }
        };

        Some(PendingWrite {
            key: S::KEY,
            value: projected.to_string(),
        })
    }

    /// Rebuild a slice from its stored form
    ///
    /// Stored fields are overlaid on the default state, so a whitelisted
    /// subset still yields a complete slice. Fields outside the whitelist are
    /// ignored.
    pub fn restore(&self, stored: &str) -> std::result::Result<S::State, StorageError> {
        let Value::Object(stored) = serde_json::from_str::<Value>(stored)? else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "persisted slice is not a JSON object",
            )
            .into());
        };

        let mut merged = slice_fields::<S>()?;
        for (field, value) in stored {
            if self.keeps(&field) {
                merged.insert(field, value);
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Read the slice back from storage
    ///
    /// Returns `None` when persistence is off or nothing usable is stored.
    /// Storage failures and corrupt entries are logged and treated as absent,
    /// so the store falls back to the slice default.
    pub async fn rehydrate(&self, storage: &dyn Storage) -> Option<S::State> {
        if !self.enabled {
            return None;
        }

        match storage.get_item(S::KEY).await {
            Ok(Some(raw)) => match self.restore(&raw) {
                Ok(state) => {
                    tracing::debug!(slice = S::KEY, "Rehydrated slice");
                    Some(state)
                }
                Err(e) => {
                    tracing::warn!(slice = S::KEY, error = %e, "Discarding corrupted persisted slice");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    slice = S::KEY,
                    backend = storage.backend_name(),
                    error = %e,
                    "Storage unavailable during rehydration"
                );
                None
            }
        }
    }
}

/// Open the storage backend selected in configuration
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::File => Arc::new(FileStorage::new(config.expanded_path())),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::new(&config.path).await?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    tracing::debug!(backend = storage.backend_name(), path = %config.path, "Opened storage");
    Ok(storage)
}
