//! Object store wrappers for fault injection.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use syncvault_storage::{ObjectStore, StorageError, StorageResult};

/// Delegates to an inner store but fails writes of index documents
/// (`*.json`) while `fail_index_writes` is set.
#[allow(dead_code)]
pub struct FailingIndexStore {
    inner: Arc<dyn ObjectStore>,
    fail_index_writes: AtomicBool,
}

#[allow(dead_code)]
impl FailingIndexStore {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            fail_index_writes: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_index_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FailingIndexStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        if key.ends_with(".json") && self.fail_index_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "injected index write failure",
            )));
        }
        self.inner.put(key, data).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    fn backend_name(&self) -> &'static str {
        "failing-index"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}
