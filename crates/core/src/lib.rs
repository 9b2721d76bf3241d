//! Core domain types for the syncvault blob gateway.
//!
//! This crate defines the data model shared by the storage, metadata and
//! server crates:
//! - Validated blob and root keys
//! - Blob entries and the per-root metadata index
//! - The secret registry used for bearer-token authorization
//! - Configuration types

pub mod config;
pub mod entry;
pub mod error;
pub mod index;
pub mod key;
pub mod registry;

pub use entry::BlobEntry;
pub use error::{Error, Result};
pub use index::MetadataIndex;
pub use key::{BlobKey, RootKey, Segment};
pub use registry::SecretRegistry;

/// Default maximum upload body size: 64 MiB
pub const DEFAULT_MAX_BODY_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum length of a single key segment.
pub const MAX_SEGMENT_LEN: usize = 128;
