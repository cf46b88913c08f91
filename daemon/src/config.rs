//! Service configuration with TOML file support.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fairdraw_draw::DrawConfig;
use fairdraw_rpc::TokenEntry;
use fairdraw_store_lmdb::environment::DEFAULT_MAP_SIZE;
use fairdraw_utils::LogFormat;
use fairdraw_vrf::DrandConfig;
use serde::Deserialize;

/// Configuration for a FairDraw service.
///
/// Loaded from a TOML file via [`ServiceConfig::from_toml_file`]; CLI flags
/// and `FAIRDRAW_*` environment variables override individual fields.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// drand network used as the randomness oracle.
    #[serde(default)]
    pub drand: DrandConfig,

    #[serde(default)]
    pub draw: DrawConfig,

    /// API tokens accepted by the HTTP API.
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./fairdraw_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            drand: DrandConfig::default(),
            draw: DrawConfig::default(),
            tokens: Vec::new(),
        }
    }
}
