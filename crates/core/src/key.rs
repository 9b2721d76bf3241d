//! Blob and root key types.
//!
//! Every key component arrives from an untrusted request path and ends up as a
//! filesystem path segment, so each one is validated against a strict
//! allow-list before any path is derived from it.

use crate::MAX_SEGMENT_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension used for blob objects.
pub const BLOB_EXTENSION: &str = "blob";

/// Extension used for per-root metadata index documents.
pub const INDEX_EXTENSION: &str = "json";

/// A validated key segment (`[A-Za-z0-9_-]{1,128}`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    /// Validate and wrap a segment. `field` names the component in errors.
    pub fn parse(field: &str, value: impl Into<String>) -> crate::Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(crate::Error::InvalidKey(format!("{field} cannot be empty")));
        }
        if value.len() > MAX_SEGMENT_LEN {
            return Err(crate::Error::InvalidKey(format!(
                "{field} must be at most {MAX_SEGMENT_LEN} chars, got {}",
                value.len()
            )));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_'))
        {
            return Err(crate::Error::InvalidKey(format!(
                "invalid character in {field}: {c:?}"
            )));
        }
        Ok(Self(value))
    }

    /// Get the segment string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse("segment", raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({})", self.0)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sync root: the (appId, rootId) namespace sharing one secret and one index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootKey {
    app_id: Segment,
    root_id: Segment,
}

impl RootKey {
    /// Parse a root key from raw request components.
    pub fn parse(app_id: &str, root_id: &str) -> crate::Result<Self> {
        Ok(Self {
            app_id: Segment::parse("appId", app_id)?,
            root_id: Segment::parse("rootId", root_id)?,
        })
    }

    pub fn app_id(&self) -> &Segment {
        &self.app_id
    }

    pub fn root_id(&self) -> &Segment {
        &self.root_id
    }

    /// Object key of this root's metadata index: `{appId}/{rootId}.json`.
    pub fn index_key(&self) -> String {
        format!("{}/{}.{INDEX_EXTENSION}", self.app_id, self.root_id)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_id, self.root_id)
    }
}

/// Full identity of one blob: (appId, rootId, deviceId, eventId).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobKey {
    root: RootKey,
    device_id: Segment,
    event_id: Segment,
}

impl BlobKey {
    /// Parse a blob key from raw request components.
    pub fn parse(app_id: &str, root_id: &str, device_id: &str, event_id: &str) -> crate::Result<Self> {
        Ok(Self {
            root: RootKey::parse(app_id, root_id)?,
            device_id: Segment::parse("deviceId", device_id)?,
            event_id: Segment::parse("eventId", event_id)?,
        })
    }

    /// Build a blob key under an already validated root.
    pub fn new(root: RootKey, device_id: Segment, event_id: Segment) -> Self {
        Self {
            root,
            device_id,
            event_id,
        }
    }

    pub fn root(&self) -> &RootKey {
        &self.root
    }

    pub fn device_id(&self) -> &Segment {
        &self.device_id
    }

    pub fn event_id(&self) -> &Segment {
        &self.event_id
    }

    /// Object key of the blob: `{appId}/{rootId}/{deviceId}/{eventId}.blob`.
    ///
    /// Each component is its own path segment in fixed order, so two distinct
    /// keys never map to the same object.
    pub fn object_key(&self) -> String {
        format!(
            "{}/{}/{}/{}.{BLOB_EXTENSION}",
            self.root.app_id, self.root.root_id, self.device_id, self.event_id
        )
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.root, self.device_id, self.event_id)
    }
}
