//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The whole file is
//! optional: every field has a default, so env-only deployments (the usual
//! container setup, `REDIS_URL` plus a mounted keys file) need no TOML.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Shared store connection settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Redis connection URL. Overridden by the `REDIS_URL` env var.
    #[serde(default = "default_store_url")]
    pub url: String,
}

/// Pool bootstrap and lease settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Keys file loaded at bootstrap, one key per line.
    /// Overridden by the `KEYS_FILE` env var.
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,
    /// Tier new keys are loaded into: "full", "mid" or "low".
    #[serde(default = "default_tier")]
    pub default_tier: String,
    /// Leases older than this are returned to their tier by the sweeper.
    #[serde(default = "default_lease_ttl")]
    pub lease_ttl_secs: u64,
    /// How often the sweeper scans for expired leases.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            keys_file: default_keys_file(),
            default_tier: default_tier(),
            lease_ttl_secs: default_lease_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_store_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("./keys.text")
}

fn default_tier() -> String {
    "full".to_string()
}

fn default_lease_ttl() -> u64 {
    1800
}

fn default_sweep_interval() -> u64 {
    60
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.overlay_env();
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.overlay_env();
        config.validate()?;
        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    /// Returns None when neither is set (defaults + env only).
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from)
    }

    fn overlay_env(&mut self) {
        if let Ok(url) = std::env::var("REDIS_URL") {
            if !url.trim().is_empty() {
                self.store.url = url;
            }
        }
        if let Ok(path) = std::env::var("KEYS_FILE") {
            if !path.trim().is_empty() {
                self.pool.keys_file = PathBuf::from(path);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let url = &self.store.url;
        let scheme_ok = ["redis://", "rediss://", "unix://"]
            .iter()
            .any(|scheme| url.starts_with(scheme));
        if !scheme_ok {
            return Err(Error::Config(format!(
                "store url must start with redis://, rediss:// or unix://, got: {url}"
            )));
        }
        match self.pool.default_tier.as_str() {
            "full" | "mid" | "low" => {}
            other => {
                return Err(Error::Config(format!(
                    "default_tier must be one of full, mid, low, got: {other}"
                )));
            }
        }
        if self.pool.lease_ttl_secs == 0 {
            return Err(Error::Config("lease_ttl_secs must be greater than 0".into()));
        }
        if self.pool.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
