//! Content-addressed attachment storage.
//!
//! Attachments arrive from the UI as data URLs. Their decoded bytes are stored once
//! under `blob:<sha256>`, and documents reference them by that id. A reference count
//! under `blob_refs:<sha256>` lets identical uploads share a blob and lets the last
//! release delete it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use ring::digest::{digest, SHA256};

use crate::app_response::AppResponse;
use crate::key_value_store::{read_json, write_json, SharedStore, BLOB_KEY_PREFIX, BLOB_REFS_KEY_PREFIX};

pub struct BlobStore {
    storage: SharedStore,
}

impl BlobStore {
    pub fn new(storage: SharedStore) -> Self {
        Self { storage }
    }

    /// Stores `bytes` (or bumps the count of an identical blob) and returns its id.
    pub fn put(&self, bytes: &[u8]) -> Result<String, AppResponse> {
        let id = blob_id(bytes);
        let refs = self.ref_count(&id)?;
        if refs == 0 {
            self.storage.write(&blob_key(&id), bytes)?;
        }
        write_json(self.storage.as_ref(), &refs_key(&id), &(refs + 1))?;
        debug!("Blob {id} now has {} references", refs + 1);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<Vec<u8>>, AppResponse> {
        self.storage.read(&blob_key(id))
    }

    /// Drops one reference. Returns `true` when the blob itself was deleted.
    pub fn release(&self, id: &str) -> Result<bool, AppResponse> {
        let refs = self.ref_count(id)?;
        if refs <= 1 {
            self.storage.remove(&refs_key(id))?;
            let removed = self.storage.remove(&blob_key(id))?;
            debug!("Blob {id} released and deleted");
            return Ok(removed);
        }
        write_json(self.storage.as_ref(), &refs_key(id), &(refs - 1))?;
        Ok(false)
    }

    pub fn ref_count(&self, id: &str) -> Result<u64, AppResponse> {
        match read_json::<u64>(self.storage.as_ref(), &refs_key(id)) {
            Ok(count) => Ok(count.unwrap_or(0)),
            // A mangled counter is treated as a single reference.
            Err(AppResponse::SerializationError(_)) => Ok(1),
            Err(e) => Err(e),
        }
    }
}

fn blob_key(id: &str) -> String {
    format!("{BLOB_KEY_PREFIX}{id}")
}

fn refs_key(id: &str) -> String {
    format!("{BLOB_REFS_KEY_PREFIX}{id}")
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn blob_id(bytes: &[u8]) -> String {
    digest(&SHA256, bytes)
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Splits `data:<mime>;base64,<payload>` into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), AppResponse> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppResponse::ValidationError("Attachment is not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppResponse::ValidationError("Data URL has no payload".to_string()))?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| {
        AppResponse::ValidationError("Only base64 data URLs are supported".to_string())
    })?;
    let mime = if mime.is_empty() {
        "application/octet-stream".to_string()
    } else {
        mime.to_string()
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime, bytes))
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
