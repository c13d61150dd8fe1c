//! Persistence seam shared by every store in the crate.
//!
//! Stores never talk to LMDB directly. They hold an `Arc<dyn KeyValueStore>` and
//! read or overwrite whole JSON-encoded collections under fixed keys, so tests can
//! swap the LMDB environment for [`MemoryStore`].

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app_response::AppResponse;

pub const FUNDS_KEY: &str = "archive_funds";
pub const DOCUMENTS_KEY: &str = "archive_documents";
pub const USERS_KEY: &str = "archive_users";
pub const CURRENT_USER_KEY: &str = "auth_user";
pub const CONTENT_KEY_PREFIX: &str = "document_content:";
pub const BLOB_KEY_PREFIX: &str = "blob:";
pub const BLOB_REFS_KEY_PREFIX: &str = "blob_refs:";

/// Byte-oriented key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppResponse>;

    fn write(&self, key: &str, value: &[u8]) -> Result<(), AppResponse>;

    /// Returns `false` when the key was absent.
    fn remove(&self, key: &str) -> Result<bool, AppResponse>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory [`KeyValueStore`], used by tests and by hosts that do not need durability.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), AppResponse> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        Ok(self.entries.lock().remove(key).is_some())
    }
}

pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, AppResponse> {
    match store.read(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), AppResponse> {
    let bytes = serde_json::to_vec(value)?;
    store.write(key, &bytes)
}

/// Loads the collection stored under `key`.
///
/// A missing or unparsable value is replaced by `default()`, which is written back
/// so the next load sees a well-formed collection. Storage errors still propagate.
pub fn load_or_default<T, F>(store: &dyn KeyValueStore, key: &str, default: F) -> Result<T, AppResponse>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    match read_json::<T>(store, key) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            let value = default();
            write_json(store, key, &value)?;
            Ok(value)
        }
        Err(AppResponse::SerializationError(msg)) => {
            warn!("Stored value under '{key}' is corrupt, resetting to default: {msg}");
            let value = default();
            write_json(store, key, &value)?;
            Ok(value)
        }
        Err(e) => Err(e),
    }
}
