//! Server configuration.
//!
//! Values come from three places, later ones winning:
//! 1. built-in defaults
//! 2. `config.yaml` in the data directory
//! 3. `SANTA_*` environment variables

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::backend::storage::csv::CsvConnection;

pub const DATA_DIR_VAR: &str = "SANTA_DATA_DIR";
pub const BIND_ADDR_VAR: &str = "SANTA_BIND_ADDR";
pub const CORS_ORIGIN_VAR: &str = "SANTA_CORS_ORIGIN";
pub const WELCOME_PACKET_CENTS_VAR: &str = "SANTA_WELCOME_PACKET_CENTS";

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_WELCOME_PACKET_CENTS: i64 = 1_999;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Allowed browser origin; any origin when unset
    pub cors_origin: Option<String>,
    pub welcome_packet_cents: i64,
}

/// Optional keys of `config.yaml`
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    cors_origin: Option<String>,
    welcome_packet_cents: Option<i64>,
}

impl ServerConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load with a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => CsvConnection::default_data_directory()?,
        };
        let file = read_file_config(&data_dir)?;

        let bind_addr = lookup(BIND_ADDR_VAR)
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", bind_addr))?;

        let cors_origin = lookup(CORS_ORIGIN_VAR)
            .or(file.cors_origin)
            .filter(|origin| !origin.trim().is_empty());

        let welcome_packet_cents = match lookup(WELCOME_PACKET_CENTS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid {} '{}'", WELCOME_PACKET_CENTS_VAR, raw))?,
            None => file.welcome_packet_cents.unwrap_or(DEFAULT_WELCOME_PACKET_CENTS),
        };
        if welcome_packet_cents <= 0 {
            anyhow::bail!("Welcome packet price must be positive, got {}", welcome_packet_cents);
        }

        Ok(Self {
            data_dir,
            bind_addr,
            cors_origin,
            welcome_packet_cents,
        })
    }

    /// Base URL of the local checkout pages
    pub fn checkout_base_url(&self) -> String {
        format!("http://{}/checkout", self.bind_addr)
    }
}

fn read_file_config(data_dir: &Path) -> Result<FileConfig> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    info!("Reading configuration from {}", path.display());
    let content = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_only_data_dir_is_set() {
        let temp_dir = TempDir::new().unwrap();
        let vars = HashMap::from([(DATA_DIR_VAR, temp_dir.path().display().to_string())]);

        let config = ServerConfig::from_lookup(lookup_from(vars)).unwrap();

        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.welcome_packet_cents, 1_999);
        assert_eq!(config.checkout_base_url(), "http://127.0.0.1:3000/checkout");
    }

    #[test]
    fn test_environment_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "bind_addr: 0.0.0.0:8080\ncors_origin: http://localhost:8080\nwelcome_packet_cents: 2500\n",
        )
        .unwrap();
        let vars = HashMap::from([
            (DATA_DIR_VAR, temp_dir.path().display().to_string()),
            (WELCOME_PACKET_CENTS_VAR, "999".to_string()),
        ]);

        let config = ServerConfig::from_lookup(lookup_from(vars)).unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.welcome_packet_cents, 999);
    }

    #[test]
    fn test_rejects_bad_values() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().display().to_string();

        let bad_addr = HashMap::from([(DATA_DIR_VAR, dir.clone()), (BIND_ADDR_VAR, "not an address".to_string())]);
        assert!(ServerConfig::from_lookup(lookup_from(bad_addr)).is_err());

        let bad_price = HashMap::from([(DATA_DIR_VAR, dir), (WELCOME_PACKET_CENTS_VAR, "0".to_string())]);
        assert!(ServerConfig::from_lookup(lookup_from(bad_price)).is_err());
    }
}
