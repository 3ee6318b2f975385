use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::sync::RwLock;

use super::{validate_key, BlobStore, StorageError, StoredBlob};

/// In-process blob store, used by tests and throwaway setups.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.blobs.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let blob = StoredBlob {
            bytes,
            content_type: content_type.to_string(),
        };
        self.blobs.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        validate_key(key)?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.blobs.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_delete_reports_presence() {
        let store = MemoryBlobStore::new();
        store.put("covers/x/cover", Bytes::from_static(b"one"), "image/png").await.unwrap();
        store.put("covers/x/cover", Bytes::from_static(b"two"), "image/webp").await.unwrap();

        let blob = store.get("covers/x/cover").await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"two"));
        assert_eq!(blob.content_type, "image/webp");
        assert_eq!(store.len().await, 1);

        assert!(store.delete("covers/x/cover").await.unwrap());
        assert!(!store.delete("covers/x/cover").await.unwrap());
        assert!(store.get("covers/x/cover").await.unwrap().is_none());
    }
}
