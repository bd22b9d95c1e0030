//! Persistent keyed store.
//!
//! The store is the only state shared between the controller and panel-side
//! consumers. It offers no transactions: each logical entity lives under a
//! single key and is mutated with one read-modify-write of that key.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tailor_common::error::StoreError;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a typed value.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyedStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
    }
}

/// Encode and write a typed value.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyedStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value).await
}

/// Volatile store, used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk.
///
/// The whole document is rewritten on every mutation through a temporary
/// file and a rename, so a crash leaves either the old or the new document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(StoreError::Corrupt {
                        key: path.display().to_string(),
                        reason: format!("expected a JSON object, found {}", json_kind(&other)),
                    });
                }
                Err(e) => {
                    return Err(StoreError::Corrupt {
                        key: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store file at {}, starting empty", path.display());
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            "Opened store at {} ({} keys)",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self, snapshot: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, payload).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyedStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        // The write guard is held through persist so the file never lags
        // behind a later in-memory mutation.
        let mut entries = self.entries.write().await;
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(&entries).await {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&entries).await {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
