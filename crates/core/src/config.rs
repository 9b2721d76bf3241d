//! Configuration types shared across crates.

use crate::registry::{SecretMap, SecretRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload body in bytes. Larger bodies get 413.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: u64,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: When enabled, ensure this endpoint is network-restricted
    /// to authorized Prometheus scraper IPs only at the infrastructure level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_body_size() -> u64 {
    crate::DEFAULT_MAX_BODY_SIZE
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_size: default_max_body_size(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Body limit as a `usize`, saturating on 32-bit targets.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_body_size).unwrap_or(usize::MAX)
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage. Blobs and index documents share this root.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data"),
        }
    }
}

/// Per-root secret configuration.
///
/// Secrets can be inlined (`[auth.secrets.<appId>]` tables) or kept in a
/// separate JSON file with the same `appId -> rootId -> token` shape.
/// Inline entries win when both define the same root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Inline secrets.
    /// WARNING: Prefer `secrets_file` or SYNCVAULT_AUTH__SECRETS__* env vars
    /// over storing tokens in the main config file.
    #[serde(default)]
    pub secrets: SecretMap,
    /// Optional path to a JSON secrets file.
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,
}

impl AuthConfig {
    /// Build the secret registry, reading `secrets_file` if configured.
    pub fn load_registry(&self) -> crate::Result<SecretRegistry> {
        let mut merged = match &self.secrets_file {
            Some(path) => read_secrets_file(path)?,
            None => SecretMap::new(),
        };
        for (app_id, roots) in &self.secrets {
            let target = merged.entry(app_id.clone()).or_default();
            for (root_id, token) in roots {
                target.insert(root_id.clone(), token.clone());
            }
        }
        SecretRegistry::from_secrets(&merged)
    }
}

fn read_secrets_file(path: &Path) -> crate::Result<SecretMap> {
    let data = std::fs::read(path).map_err(|e| {
        crate::Error::InvalidRegistry(format!(
            "failed to read secrets file {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_slice(&data).map_err(|e| {
        crate::Error::InvalidRegistry(format!(
            "failed to parse secrets file {}: {e}",
            path.display()
        ))
    })
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Secret registry configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage under `path` and a single
    /// root `app1/root1` with token `test-token`.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        let mut secrets = SecretMap::new();
        secrets
            .entry("app1".to_string())
            .or_default()
            .insert("root1".to_string(), "test-token".to_string());

        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::Filesystem { path: path.into() },
            auth: AuthConfig {
                secrets,
                secrets_file: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.max_body_size, crate::DEFAULT_MAX_BODY_SIZE);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_app_config_deserialize_minimal() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert!(config.auth.secrets.is_empty());
        match config.storage {
            StorageConfig::Filesystem { path } => assert_eq!(path, PathBuf::from("./data")),
        }
    }

    #[test]
    fn test_storage_config_tagged() {
        let json = r#"{"type":"filesystem","path":"/var/lib/syncvault"}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();
        match config {
            StorageConfig::Filesystem { path } => {
                assert_eq!(path, PathBuf::from("/var/lib/syncvault"))
            }
        }
    }

    #[test]
    fn test_load_registry_inline() {
        let config = AppConfig::for_testing("/tmp/unused");
        let registry = config.auth.load_registry().unwrap();
        assert!(registry.verify("app1", "root1", "test-token"));
    }

    #[test]
    fn test_load_registry_merges_file_and_inline() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("secrets.json");
        std::fs::write(
            &file,
            r#"{"app1": {"root1": "from-file", "root2": "file-only"}}"#,
        )
        .unwrap();

        let mut config = AppConfig::for_testing(temp.path());
        config.auth.secrets_file = Some(file);

        let registry = config.auth.load_registry().unwrap();
        assert!(registry.verify("app1", "root1", "test-token"));
        assert!(!registry.verify("app1", "root1", "from-file"));
        assert!(registry.verify("app1", "root2", "file-only"));
    }

    #[test]
    fn test_load_registry_missing_file() {
        let config = AuthConfig {
            secrets: SecretMap::new(),
            secrets_file: Some(PathBuf::from("/nonexistent/secrets.json")),
        };
        let err = config.load_registry().unwrap_err();
        assert!(err.to_string().contains("failed to read secrets file"));
    }
}
