//! Per-root serialization of metadata index updates.

use dashmap::DashMap;
use std::sync::Arc;
use syncvault_core::RootKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per sync root.
///
/// Mutexes are created on first use and kept for the life of the process.
/// Holding a root's guard serializes the load/mutate/save cycle of that
/// root's index; different roots never contend.
#[derive(Clone, Default)]
pub struct RootLocks {
    locks: Arc<DashMap<RootKey, Arc<Mutex<()>>>>,
}

impl RootLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `root`.
    pub async fn lock(&self, root: &RootKey) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let mutex = self.locks.entry(root.clone()).or_default().clone();
        mutex.lock_owned().await
    }

    /// Number of roots that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
