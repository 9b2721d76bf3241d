//! Keyed blob store.
//!
//! Maps a validated [`BlobKey`] onto `{appId}/{rootId}/{deviceId}/{eventId}.blob`
//! in the underlying object store. Holds no index of its own.

use crate::error::{StorageError, StorageResult};
use crate::traits::ObjectStore;
use bytes::Bytes;
use std::sync::Arc;
use syncvault_core::BlobKey;

/// Result of a blob write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    /// Whether a blob already existed under the key before this write.
    pub existed: bool,
}

/// Opaque byte storage keyed by [`BlobKey`].
#[derive(Clone)]
pub struct BlobStore {
    objects: Arc<dyn ObjectStore>,
}

impl BlobStore {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Underlying object store.
    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// Whether a blob exists under `key`.
    pub async fn exists(&self, key: &BlobKey) -> StorageResult<bool> {
        self.objects.exists(&key.object_key()).await
    }

    /// Write `data` under `key`, replacing any previous blob.
    ///
    /// The presence check and the write are not atomic with respect to each
    /// other; callers that need an exact `existed` hold the root lock.
    pub async fn put(&self, key: &BlobKey, data: Bytes) -> StorageResult<PutOutcome> {
        let object_key = key.object_key();
        let existed = self.objects.exists(&object_key).await?;
        self.objects.put(&object_key, data).await?;
        Ok(PutOutcome { existed })
    }

    /// Read the exact bytes last written under `key`.
    pub async fn get(&self, key: &BlobKey) -> StorageResult<Bytes> {
        self.objects.get(&key.object_key()).await
    }

    /// Remove the blob under `key`.
    ///
    /// Idempotent: returns `false` instead of failing when nothing was there.
    pub async fn delete(&self, key: &BlobKey) -> StorageResult<bool> {
        match self.objects.delete(&key.object_key()).await {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilesystemBackend;

    async fn store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).await.unwrap();
        (dir, BlobStore::new(Arc::new(backend)))
    }

    fn key(device: &str, event: &str) -> BlobKey {
        BlobKey::parse("app1", "root1", device, event).unwrap()
    }

    #[tokio::test]
    async fn test_put_reports_existed() {
        let (_dir, blobs) = store().await;
        let k = key("devA", "ev1");

        assert!(!blobs.put(&k, Bytes::from("hello")).await.unwrap().existed);
        assert!(blobs.put(&k, Bytes::from("hi")).await.unwrap().existed);
        assert_eq!(blobs.get(&k).await.unwrap(), Bytes::from("hi"));
    }

    #[tokio::test]
    async fn test_layout_on_disk() {
        let (dir, blobs) = store().await;
        blobs
            .put(&key("devA", "ev1"), Bytes::from_static(b"\x00\x01\xff"))
            .await
            .unwrap();

        let path = dir.path().join("app1/root1/devA/ev1.blob");
        assert_eq!(std::fs::read(path).unwrap(), vec![0x00, 0x01, 0xff]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, blobs) = store().await;
        let k = key("devA", "ev1");

        assert!(!blobs.delete(&k).await.unwrap());
        blobs.put(&k, Bytes::from("x")).await.unwrap();
        assert!(blobs.delete(&k).await.unwrap());
        assert!(!blobs.delete(&k).await.unwrap());

        assert!(matches!(blobs.get(&k).await, Err(StorageError::NotFound(_))));
        assert!(!blobs.exists(&k).await.unwrap());
    }
}
