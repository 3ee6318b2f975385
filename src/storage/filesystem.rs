use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;

use super::{validate_key, BlobStore, StorageError, StoredBlob};

const CONTENT_TYPE_SUFFIX: &str = ".ctype";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Filesystem-backed blob store.
///
/// A key maps to the same relative path under `base_path`; the content type
/// sits next to it in a `<path>.ctype` sidecar. Writes land in `.tmp` first and
/// are renamed into place, so readers never see a half-written blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self { base_path })
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn sidecar_path(blob_path: &std::path::Path) -> PathBuf {
        let mut name = blob_path.as_os_str().to_owned();
        name.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_atomically(&self, target: &std::path::Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let blob_path = self.blob_path(key)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.write_atomically(&Self::sidecar_path(&blob_path), content_type.as_bytes())
            .await?;
        self.write_atomically(&blob_path, &bytes).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, StorageError> {
        let blob_path = self.blob_path(key)?;
        let bytes = match fs::read(&blob_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content_type = match fs::read_to_string(Self::sidecar_path(&blob_path)).await {
            Ok(ct) if !ct.trim().is_empty() => ct.trim().to_string(),
            Ok(_) => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StoredBlob {
            bytes: Bytes::from(bytes),
            content_type,
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(key)?;
        let removed = match fs::remove_file(&blob_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        match fs::remove_file(Self::sidecar_path(&blob_path)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FilesystemBlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("blobs")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn stores_bytes_with_content_type() {
        let (store, _dir) = temp_store().await;
        let key = "weddings/w1/u1.jpg";
        store.put(key, Bytes::from_static(b"jpeg bytes"), "image/jpeg").await.unwrap();

        let blob = store.get(key).await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"jpeg bytes"));
        assert_eq!(blob.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn missing_blob_is_none() {
        let (store, _dir) = temp_store().await;
        assert!(store.get("weddings/w1/none.jpg").await.unwrap().is_none());
        assert!(!store.delete("weddings/w1/none.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_cover() {
        let (store, _dir) = temp_store().await;
        store.put("covers/w1/cover", Bytes::from_static(b"png"), "image/png").await.unwrap();
        store.put("covers/w1/cover", Bytes::from_static(b"webp"), "image/webp").await.unwrap();

        let blob = store.get("covers/w1/cover").await.unwrap().unwrap();
        assert_eq!(blob.bytes, Bytes::from_static(b"webp"));
        assert_eq!(blob.content_type, "image/webp");
    }

    #[tokio::test]
    async fn delete_removes_blob_and_sidecar() {
        let (store, dir) = temp_store().await;
        store.put("weddings/w1/u1.mp4", Bytes::from_static(b"mp4"), "video/mp4").await.unwrap();
        assert!(store.delete("weddings/w1/u1.mp4").await.unwrap());

        let base = dir.path().join("blobs/weddings/w1");
        assert!(!base.join("u1.mp4").exists());
        assert!(!base.join("u1.mp4.ctype").exists());
    }

    #[tokio::test]
    async fn traversal_is_refused() {
        let (store, _dir) = temp_store().await;
        let err = store
            .put("../escape", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
