//! Startup helpers: configuration loading and secret registry construction.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::Path;
use syncvault_core::SecretRegistry;
use syncvault_core::config::{AppConfig, AuthConfig};

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "SYNCVAULT_";

/// Load configuration from an optional TOML file overlaid with
/// `SYNCVAULT_`-prefixed environment variables (`__` separates nested keys,
/// e.g. `SYNCVAULT_SERVER__BIND`).
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        tracing::info!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(
            config_path = %path.display(),
            "No config file found, using defaults and environment variables"
        );
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("failed to load configuration")
}

/// Build the secret registry, warning when no root is configured.
pub fn load_registry(config: &AuthConfig) -> Result<SecretRegistry> {
    let registry = config
        .load_registry()
        .context("failed to load secret registry")?;

    if registry.is_empty() {
        tracing::warn!("No sync roots configured; every sync request will be rejected with 401");
    } else {
        tracing::info!(roots = registry.len(), "Secret registry loaded");
    }

    Ok(registry)
}
