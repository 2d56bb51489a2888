//! Configuration management for kgraph services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`KGRAPH__` prefix, `__` separator)
//! 2. Config file (`kgraph.toml` by default)
//! 3. Defaults

use std::path::PathBuf;

use serde::Deserialize;

/// Errors raised while loading or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KgConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// Where graph records live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Snapshot file for the `file` backend.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    File,
}

/// Token issuance and validation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub issuer: String,
    /// Checked only when set.
    pub audience: Option<String>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    /// Whether graph operations require a valid access token.
    pub require_auth: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            path: PathBuf::from("./kgraph-data.json"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost:8000".to_string(),
            audience: None,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            require_auth: true,
        }
    }
}

impl KgConfig {
    /// Load from `{file_prefix}.toml` (optional) and `KGRAPH__*` variables.
    pub fn load(file_prefix: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("KGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: KgConfig = cfg.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(
            backend = ?loaded.storage.backend,
            issuer = %loaded.auth.issuer,
            require_auth = loaded.auth.require_auth,
            "Configuration loaded"
        );
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.access_token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.access_token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.refresh_token_ttl_secs < self.auth.access_token_ttl_secs {
            return Err(ConfigError::Invalid(
                "auth.refresh_token_ttl_secs must not be shorter than the access token lifetime"
                    .to_string(),
            ));
        }
        if self.auth.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.issuer must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KgConfig::default();
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.auth.issuer, "https://localhost:8000");
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.auth.refresh_token_ttl_secs, 86_400);
        assert!(config.auth.audience.is_none());
        assert!(config.auth.require_auth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = KgConfig::load("definitely-not-a-kgraph-config-file").unwrap();
        assert_eq!(config.auth.access_token_ttl_secs, 900);
    }

    #[test]
    fn test_rejects_zero_access_ttl() {
        let mut config = KgConfig::default();
        config.auth.access_token_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_refresh_shorter_than_access() {
        let mut config = KgConfig::default();
        config.auth.refresh_token_ttl_secs = 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
