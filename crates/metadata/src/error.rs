//! Metadata store error types.

use syncvault_core::RootKey;
use syncvault_storage::StorageError;
use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted index for a root exists but could not be parsed.
    /// Never treated as an empty index.
    #[error("metadata index for {root} is corrupt: {reason}")]
    Corrupt { root: RootKey, reason: String },

    #[error("failed to serialize metadata index for {root}: {reason}")]
    Serialization { root: RootKey, reason: String },
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
