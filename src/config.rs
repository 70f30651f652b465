//! Process configuration: backend location, resource-type schema directory,
//! and the token-verification settings an external HTTP layer would need.
//! Loaded from a JSON file on disk, then overridden by environment
//! variables (`QVARN_BACKEND`, `QVARN_RESOURCE_TYPES_PATH`,
//! `QVARN_TOKEN_ISSUER`, `QVARN_TOKEN_AUDIENCE`, `QVARN_TOKEN_SIGNING_KEY`,
//! `QVARN_DEBUG`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the RocksDB data directory.
    pub backend: PathBuf,

    /// Directory of resource-type schema files (`*.yaml`/`*.json`), loaded at
    /// startup to populate the schema registry.
    pub resource_types_path: PathBuf,

    /// OIDC issuer an external auth layer should verify tokens against.
    #[serde(default)]
    pub token_issuer: Option<String>,

    /// Expected audience claim for an external auth layer.
    #[serde(default)]
    pub token_audience: Option<String>,

    /// Signing key (or JWKS URL) for an external auth layer.
    #[serde(default)]
    pub token_signing_key: Option<String>,

    #[serde(default)]
    pub debug: bool,
}

impl Config {
    /// Loads config from `path`, applying `QVARN_*` environment overrides —
    /// `QVARN_BACKEND`, `QVARN_RESOURCE_TYPES_PATH`, `QVARN_TOKEN_ISSUER`,
    /// `QVARN_TOKEN_AUDIENCE`, `QVARN_TOKEN_SIGNING_KEY`, `QVARN_DEBUG`.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            return Err(StoreError::Internal(format!(
                "config file not found: {}",
                path.display()
            )));
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QVARN_BACKEND") {
            self.backend = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("QVARN_RESOURCE_TYPES_PATH") {
            self.resource_types_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("QVARN_TOKEN_ISSUER") {
            self.token_issuer = Some(v);
        }
        if let Ok(v) = std::env::var("QVARN_TOKEN_AUDIENCE") {
            self.token_audience = Some(v);
        }
        if let Ok(v) = std::env::var("QVARN_TOKEN_SIGNING_KEY") {
            self.token_signing_key = Some(v);
        }
        if let Ok(v) = std::env::var("QVARN_DEBUG") {
            self.debug = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            backend: dir.path().join("db"),
            resource_types_path: dir.path().join("schemas"),
            token_issuer: Some("https://issuer.example".to_string()),
            token_audience: None,
            token_signing_key: None,
            debug: true,
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.backend, config.backend);
        assert_eq!(loaded.token_issuer, config.token_issuer);
        assert!(loaded.debug);
    }

    #[test]
    fn env_override_takes_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            backend: dir.path().join("db"),
            resource_types_path: dir.path().join("schemas"),
            token_issuer: None,
            token_audience: None,
            token_signing_key: None,
            debug: false,
        };
        config.save(&path).unwrap();

        std::env::set_var("QVARN_DEBUG", "true");
        let loaded = Config::load(&path).unwrap();
        std::env::remove_var("QVARN_DEBUG");
        assert!(loaded.debug);
    }
}
