//! Metadata index persistence for syncvault.
//!
//! Each sync root owns one index document, `{appId}/{rootId}.json`, stored
//! next to the root's blob directory. This crate loads and saves whole
//! documents; serializing concurrent read-modify-write cycles is the
//! caller's job.

pub mod error;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use store::{JsonIndexStore, MetadataStore};

use std::sync::Arc;
use syncvault_storage::ObjectStore;

/// Create a metadata store sharing the given object store with the blobs.
pub fn from_objects(objects: Arc<dyn ObjectStore>) -> Arc<dyn MetadataStore> {
    Arc::new(JsonIndexStore::new(objects))
}
