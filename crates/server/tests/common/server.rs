//! Server test utilities.

use std::sync::Arc;
use syncvault_core::config::{AppConfig, StorageConfig};
use syncvault_server::{AppState, create_router};
use syncvault_storage::{FilesystemBackend, ObjectStore};
use tempfile::TempDir;

/// Token for the `app1/root1` root configured by [`AppConfig::for_testing`].
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-token";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(modifier, |backend| backend).await
    }

    /// Create a test server whose object store is wrapped by `wrap`.
    pub async fn with_storage<W>(wrap: W) -> Self
    where
        W: FnOnce(Arc<dyn ObjectStore>) -> Arc<dyn ObjectStore>,
    {
        Self::build(|_| {}, wrap).await
    }

    async fn build<F, W>(modifier: F, wrap: W) -> Self
    where
        F: FnOnce(&mut AppConfig),
        W: FnOnce(Arc<dyn ObjectStore>) -> Arc<dyn ObjectStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage_path = temp_dir.path().join("storage");

        let mut config = AppConfig::for_testing(&storage_path);
        modifier(&mut config);

        let backend: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );
        let storage = wrap(backend);

        let registry = config
            .auth
            .load_registry()
            .expect("Failed to build secret registry");

        syncvault_server::metrics::register_metrics();
        let state = AppState::new(config, storage, registry);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Storage root on disk.
    pub fn storage_path(&self) -> std::path::PathBuf {
        match &self.state.config.storage {
            StorageConfig::Filesystem { path } => path.clone(),
        }
    }
}
