//! Configuration loading for the SemSearch backend.
//!
//! `load_or_create_config` mirrors the service bootstrap flow: read the TOML
//! config if present, otherwise write the defaults so the operator has a
//! file to edit on the next run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Env var that overrides the default config location.
pub const CONFIG_ENV: &str = "SEMSEARCH_CONFIG";

static DEFAULT_CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from("semsearch.toml"), PathBuf::from)
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub embedder: EmbedderConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the persisted corpus (JSON rows of id / text / embedding).
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/embeddings.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached query results (LRU beyond this).
    pub capacity: usize,
    /// Seconds a cached result stays valid.
    pub ttl_secs: u64,
    /// Deadline for a single cache get/put before it degrades to a miss.
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_secs: 3600,
            op_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Deterministic local pseudo-embeddings; no model required.
    #[default]
    Hash,
    /// External embedding service reached over HTTP.
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    /// Endpoint of the external embedding service (`kind = "http"` only).
    pub endpoint: String,
    /// Per-attempt deadline for an embed call.
    pub timeout_ms: u64,
    /// Attempts before an embed failure becomes fatal for the query.
    pub max_retries: u32,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Hash,
            endpoint: "http://127.0.0.1:8001/embed".into(),
            timeout_ms: 5000,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default env-filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log file path; empty means stderr only.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
        }
    }
}

/// Load the config from `path` (or the default location), writing a default
/// file on first run so there is always something to edit.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map_or_else(|| DEFAULT_CONFIG_PATH.clone(), Path::to_path_buf);
    if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = toml::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        return Ok(cfg);
    }

    let cfg = AppConfig::default();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(&cfg).context("serialize default config")?;
    fs::write(&path, raw).with_context(|| format!("write default config {}", path.display()))?;
    Ok(cfg)
}
