//! Application state shared across handlers.

use crate::coordinator::SyncCoordinator;
use std::sync::Arc;
use syncvault_core::SecretRegistry;
use syncvault_core::config::AppConfig;
use syncvault_storage::ObjectStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend holding blobs and index documents.
    pub storage: Arc<dyn ObjectStore>,
    /// Per-root secrets.
    pub registry: Arc<SecretRegistry>,
    /// Blob and index coordination.
    pub coordinator: Arc<SyncCoordinator>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The coordinator keeps its blobs and its index documents in `storage`.
    pub fn new(config: AppConfig, storage: Arc<dyn ObjectStore>, registry: SecretRegistry) -> Self {
        let coordinator = Arc::new(SyncCoordinator::new(storage.clone()));
        Self {
            config: Arc::new(config),
            storage,
            registry: Arc::new(registry),
            coordinator,
        }
    }
}
