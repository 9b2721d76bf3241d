//! Per-root metadata index.
//!
//! The index is a two-level map `deviceId -> eventId -> BlobEntry`. All
//! mutations here are in-memory; persistence and serialization of the
//! load/mutate/save cycle belong to the metadata store and the coordinator.

use crate::entry::BlobEntry;
use crate::key::Segment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata index for one (appId, rootId).
///
/// Invariant: no device bucket is ever empty. `remove` prunes buckets and
/// `from_slice` drops empty buckets found on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataIndex {
    devices: BTreeMap<Segment, BTreeMap<Segment, BlobEntry>>,
}

impl MetadataIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted index document.
    ///
    /// Fails if the document is not the expected shape, or if an entry's
    /// `device_id`/`event_id` disagree with the map keys it is stored under.
    pub fn from_slice(data: &[u8]) -> crate::Result<Self> {
        let mut index: Self = serde_json::from_slice(data)
            .map_err(|e| crate::Error::Serialization(e.to_string()))?;

        for (device_id, events) in &index.devices {
            for (event_id, entry) in events {
                if &entry.device_id != device_id || &entry.event_id != event_id {
                    return Err(crate::Error::Serialization(format!(
                        "entry {}/{} stored under {device_id}/{event_id}",
                        entry.device_id, entry.event_id
                    )));
                }
            }
        }

        index.devices.retain(|_, events| !events.is_empty());
        Ok(index)
    }

    /// Serialize the whole index document.
    pub fn to_vec(&self) -> crate::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Insert or replace the entry at (deviceId, eventId).
    ///
    /// Returns the entry it replaced, if any.
    pub fn upsert(&mut self, entry: BlobEntry) -> Option<BlobEntry> {
        self.devices
            .entry(entry.device_id.clone())
            .or_default()
            .insert(entry.event_id.clone(), entry)
    }

    /// Remove the entry at (deviceId, eventId), pruning the device bucket if
    /// it becomes empty. Absent entries are a no-op.
    pub fn remove(&mut self, device_id: &Segment, event_id: &Segment) -> Option<BlobEntry> {
        let events = self.devices.get_mut(device_id)?;
        let removed = events.remove(event_id);
        if events.is_empty() {
            self.devices.remove(device_id);
        }
        removed
    }

    /// Look up a single entry.
    pub fn get(&self, device_id: &Segment, event_id: &Segment) -> Option<&BlobEntry> {
        self.devices.get(device_id)?.get(event_id)
    }

    /// Iterate all entries, optionally restricted to one device.
    pub fn list<'a>(
        &'a self,
        device_filter: Option<&'a Segment>,
    ) -> impl Iterator<Item = &'a BlobEntry> + 'a {
        self.devices
            .iter()
            .filter(move |(device_id, _)| device_filter.is_none_or(|d| d == *device_id))
            .flat_map(|(_, events)| events.values())
    }

    /// Number of entries across all devices.
    pub fn len(&self) -> usize {
        self.devices.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of device buckets.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Whether a bucket exists for `device_id`.
    pub fn has_device(&self, device_id: &Segment) -> bool {
        self.devices.contains_key(device_id)
    }
}
