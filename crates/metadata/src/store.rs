//! Metadata store trait and the JSON document implementation.

use crate::error::{MetadataError, MetadataResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use syncvault_core::{MetadataIndex, RootKey};
use syncvault_storage::{ObjectStore, StorageError};

/// Whole-document persistence of per-root metadata indexes.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load the index for `root`. A root that was never written loads as an
    /// empty index; an unreadable document is [`MetadataError::Corrupt`].
    async fn load(&self, root: &RootKey) -> MetadataResult<MetadataIndex>;

    /// Replace the persisted index for `root` with `index`.
    async fn save(&self, root: &RootKey, index: &MetadataIndex) -> MetadataResult<()>;
}

/// Stores each index as a JSON document in an [`ObjectStore`].
pub struct JsonIndexStore {
    objects: Arc<dyn ObjectStore>,
}

impl JsonIndexStore {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }
}

#[async_trait]
impl MetadataStore for JsonIndexStore {
    async fn load(&self, root: &RootKey) -> MetadataResult<MetadataIndex> {
        let data = match self.objects.get(&root.index_key()).await {
            Ok(data) => data,
            Err(StorageError::NotFound(_)) => return Ok(MetadataIndex::new()),
            Err(e) => return Err(e.into()),
        };

        MetadataIndex::from_slice(&data).map_err(|e| {
            tracing::error!(root = %root, error = %e, "metadata index is corrupt");
            MetadataError::Corrupt {
                root: root.clone(),
                reason: e.to_string(),
            }
        })
    }

    async fn save(&self, root: &RootKey, index: &MetadataIndex) -> MetadataResult<()> {
        let data = index.to_vec().map_err(|e| MetadataError::Serialization {
            root: root.clone(),
            reason: e.to_string(),
        })?;
        self.objects.put(&root.index_key(), Bytes::from(data)).await?;
        tracing::debug!(root = %root, entries = index.len(), "saved metadata index");
        Ok(())
    }
}
