//! Sync coordinator: keeps blob files and the per-root metadata index in step.
//!
//! Every mutation of a root runs its whole load/mutate/save cycle under that
//! root's lock. The index is loaded first so that a corrupt document aborts the
//! operation before the blob is touched. A failed index save after a successful
//! blob write leaves the two out of sync; that is logged, counted and returned
//! as an error rather than rolled back.
//!
//! Once the lock is held, the cycle runs on its own task. Dropping the caller's
//! future (client disconnect, request timeout) abandons only the wait for the
//! result; the blob write and the index save still finish together.

use crate::error::{ApiError, ApiResult};
use crate::locks::RootLocks;
use crate::metrics::{
    BYTES_UPLOADED, INDEX_CORRUPT, INDEX_DIVERGENCES, UPLOAD_DURATION, record_delete,
    record_upload,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use syncvault_core::{BlobEntry, BlobKey, MetadataIndex, RootKey, Segment};
use syncvault_metadata::{MetadataError, MetadataStore};
use syncvault_storage::{BlobStore, ObjectStore};
use time::OffsetDateTime;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Whether an upload created a new blob or replaced an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStatus {
    Created,
    Updated,
}

/// Result of a successful upload.
#[derive(Clone, Debug)]
pub struct UploadReceipt {
    /// The index entry now recorded for the blob.
    pub entry: BlobEntry,
    pub status: UploadStatus,
}

/// Pairs blob operations with index updates.
#[derive(Clone)]
pub struct SyncCoordinator {
    blobs: BlobStore,
    metadata: Arc<dyn MetadataStore>,
    locks: RootLocks,
}

impl SyncCoordinator {
    /// Build a coordinator whose blobs and index documents share one object
    /// store.
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        let metadata = syncvault_metadata::from_objects(objects.clone());
        Self::with_stores(BlobStore::new(objects), metadata)
    }

    pub fn with_stores(blobs: BlobStore, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            metadata,
            locks: RootLocks::new(),
        }
    }

    /// Store `data` under `key` and record it in the root's index.
    #[tracing::instrument(skip_all, fields(root = %key.root(), device_id = %key.device_id(), event_id = %key.event_id(), size = data.len()))]
    pub async fn upload(&self, key: &BlobKey, data: Bytes) -> ApiResult<UploadReceipt> {
        let guard = self.locks.lock(key.root()).await;

        let this = self.clone();
        let key = key.clone();
        let task = tokio::spawn(
            async move { this.upload_locked(guard, &key, data).await }
                .instrument(tracing::Span::current()),
        );
        join_locked(task, "upload").await
    }

    async fn upload_locked(
        &self,
        _guard: OwnedMutexGuard<()>,
        key: &BlobKey,
        data: Bytes,
    ) -> ApiResult<UploadReceipt> {
        let root = key.root();
        let size = data.len() as u64;
        let start_time = Instant::now();

        let mut index = self.load_index(root).await.inspect_err(|_| {
            record_upload("failed");
        })?;

        let outcome = self.blobs.put(key, data).await.inspect_err(|e| {
            record_upload("failed");
            tracing::error!(error = %e, "blob write failed, index left untouched");
        })?;

        let entry = BlobEntry::for_upload(key, size, OffsetDateTime::now_utc());
        index.upsert(entry.clone());
        self.save_index(root, &index, "upload").await.inspect_err(|_| {
            record_upload("failed");
        })?;

        let status = if outcome.existed {
            UploadStatus::Updated
        } else {
            UploadStatus::Created
        };

        UPLOAD_DURATION.observe(start_time.elapsed().as_secs_f64());
        BYTES_UPLOADED.inc_by(size);
        record_upload(match status {
            UploadStatus::Created => "created",
            UploadStatus::Updated => "updated",
        });
        tracing::info!(status = ?status, "blob stored");

        Ok(UploadReceipt { entry, status })
    }

    /// Read the exact bytes last uploaded under `key`.
    ///
    /// Takes no lock: blob writes are atomic renames, so a reader sees either
    /// the old or the new content.
    pub async fn download(&self, key: &BlobKey) -> ApiResult<Bytes> {
        Ok(self.blobs.get(key).await?)
    }

    /// Remove the blob under `key` and its index entry.
    ///
    /// Idempotent: deleting something that is not there succeeds. Returns
    /// whether anything was removed.
    #[tracing::instrument(skip_all, fields(root = %key.root(), device_id = %key.device_id(), event_id = %key.event_id()))]
    pub async fn delete(&self, key: &BlobKey) -> ApiResult<bool> {
        let guard = self.locks.lock(key.root()).await;

        let this = self.clone();
        let key = key.clone();
        let task = tokio::spawn(
            async move { this.delete_locked(guard, &key).await }
                .instrument(tracing::Span::current()),
        );
        join_locked(task, "delete").await
    }

    async fn delete_locked(&self, _guard: OwnedMutexGuard<()>, key: &BlobKey) -> ApiResult<bool> {
        let root = key.root();

        let mut index = self.load_index(root).await.inspect_err(|_| {
            record_delete("failed");
        })?;

        let blob_removed = self.blobs.delete(key).await.inspect_err(|e| {
            record_delete("failed");
            tracing::error!(error = %e, "blob delete failed, index left untouched");
        })?;

        let entry_removed = index.remove(key.device_id(), key.event_id()).is_some();
        if entry_removed {
            self.save_index(root, &index, "delete").await.inspect_err(|_| {
                record_delete("failed");
            })?;
        } else if blob_removed {
            tracing::warn!("deleted a blob that had no index entry");
        }

        let removed = blob_removed || entry_removed;
        record_delete(if removed { "removed" } else { "absent" });
        tracing::debug!(blob_removed, entry_removed, "delete finished");
        Ok(removed)
    }

    /// List a root's entries, optionally restricted to one device.
    ///
    /// Served from the index alone; blob storage is never scanned.
    pub async fn list(
        &self,
        root: &RootKey,
        device_filter: Option<&Segment>,
    ) -> ApiResult<Vec<BlobEntry>> {
        let index = self.load_index(root).await?;
        Ok(index.list(device_filter).cloned().collect())
    }

    async fn load_index(&self, root: &RootKey) -> ApiResult<MetadataIndex> {
        self.metadata.load(root).await.map_err(|e| {
            if matches!(e, MetadataError::Corrupt { .. }) {
                INDEX_CORRUPT.inc();
            }
            ApiError::from(e)
        })
    }

    async fn save_index(
        &self,
        root: &RootKey,
        index: &MetadataIndex,
        operation: &'static str,
    ) -> ApiResult<()> {
        self.metadata.save(root, index).await.map_err(|e| {
            INDEX_DIVERGENCES.inc();
            tracing::error!(
                root = %root,
                operation,
                error = %e,
                "blob storage changed but index save failed; index is out of sync"
            );
            ApiError::from(e)
        })
    }
}

/// Wait for a locked critical section spawned by [`SyncCoordinator`].
async fn join_locked<T>(task: JoinHandle<ApiResult<T>>, operation: &'static str) -> ApiResult<T> {
    task.await.map_err(|e| {
        tracing::error!(operation, error = %e, "critical section task failed");
        ApiError::Internal(format!("{operation} task failed: {e}"))
    })?
}
