//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;

/// String-keyed object store with whole-object semantics.
///
/// Keys are `/`-separated relative paths. Writes replace the whole object and
/// must never leave a partially written object visible to readers.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    ///
    /// Fails with `StorageError::NotFound` if the object does not exist.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Put an object atomically, creating any missing parent levels.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object.
    ///
    /// Fails with `StorageError::NotFound` if the object does not exist;
    /// callers that want idempotent deletes map that case themselves.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called at startup and by the health endpoint. The default
    /// implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
