//! HTTP gateway for syncvault.
//!
//! This crate provides the HTTP surface:
//! - Blob upload, download and delete under `/v1/sync/{appId}/{rootId}/...`
//! - Per-root listing backed by the root's metadata index
//! - Per-root bearer token authorization
//! - Health, capability and Prometheus endpoints

pub mod auth;
pub mod bootstrap;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::TraceId;
pub use coordinator::{SyncCoordinator, UploadReceipt, UploadStatus};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
