//! Metadata records for stored blobs.

use crate::key::{BlobKey, Segment};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One entry of a root's metadata index.
///
/// Describes a blob without touching its content: which device/event it
/// belongs to, when it was last written and how many bytes it holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub device_id: Segment,
    pub event_id: Segment,
    /// Time of the most recent successful upload (RFC 3339 on the wire).
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Payload size in bytes.
    pub size: u64,
}

impl BlobEntry {
    /// Build the entry describing a blob just written under `key`.
    pub fn for_upload(key: &BlobKey, size: u64, created_at: OffsetDateTime) -> Self {
        Self {
            device_id: key.device_id().clone(),
            event_id: key.event_id().clone(),
            created_at,
            size,
        }
    }
}
