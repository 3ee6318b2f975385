//! Blob storage for guest media and cover images.
//!
//! Blobs are addressed by opaque string keys built with [`media_key`] and
//! [`cover_key`]. Content type travels with the blob so it can be served back
//! without consulting the row store.

mod filesystem;
mod memory;

pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use axum::body::Bytes;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, replacing any previous blob at that key.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError>;

    /// Returns `true` if a blob was removed, `false` if none existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}

/// `weddings/{wedding_id}/{upload_id}.{ext}`
pub fn media_key(wedding_id: Uuid, upload_id: Uuid, extension: &str) -> String {
    format!("weddings/{wedding_id}/{upload_id}.{extension}")
}

/// Fixed per event, so a new cover overwrites the previous one.
pub fn cover_key(wedding_id: Uuid) -> String {
    format!("covers/{wedding_id}/cover")
}

/// Keys are relative, `/`-separated and free of empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad_segment = key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\'));

    if key.is_empty() || key.starts_with('/') || bad_segment {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_valid_and_namespaced() {
        let wedding = Uuid::new_v4();
        let upload = Uuid::new_v4();

        let key = media_key(wedding, upload, "jpg");
        assert!(key.starts_with(&format!("weddings/{wedding}/")));
        assert!(validate_key(&key).is_ok());
        assert!(validate_key(&cover_key(wedding)).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        for key in ["", "/etc/passwd", "a/../b", "a//b", "./a", "a\\b", "covers/"] {
            assert!(validate_key(key).is_err(), "{key} should be rejected");
        }
    }
}
