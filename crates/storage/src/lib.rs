//! Blob storage for syncvault.
//!
//! This crate provides:
//! - A string-keyed object store abstraction with atomic whole-object writes
//! - A local filesystem backend with path traversal protection
//! - [`BlobStore`], which maps validated blob keys onto the object layout

pub mod backends;
pub mod blobs;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use blobs::{BlobStore, PutOutcome};
pub use error::{StorageError, StorageResult};
pub use traits::ObjectStore;

use std::sync::Arc;
use syncvault_core::config::StorageConfig;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
