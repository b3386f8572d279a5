use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Repository layout constants
// =============================================================================

/// File name of a repository index, both on disk and under a repository URL
pub const INDEX_FILE_NAME: &str = "index.yaml";

/// Suffix of packaged chart archives
pub const ARCHIVE_SUFFIX: &str = ".tgz";

/// Schema version written into new indexes
pub const API_VERSION: &str = "v1";

// =============================================================================
// Time-related constants
// =============================================================================

/// Default lifetime of a cached repository index in milliseconds (3 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 3 * 60 * 1000;

/// Timeout for a single HTTP fetch in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub cache: CacheConfig,
    /// Directory for mirrored index files; defaults to [`cache_dir`]
    pub repository_cache: Option<PathBuf>,
}

/// In-memory index cache configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Lifetime of a cached index in milliseconds
    pub ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL_MS,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Directory used for mirrored index files
    pub fn repository_cache_dir(&self) -> PathBuf {
        self.repository_cache.clone().unwrap_or_else(cache_dir)
    }
}

/// Returns the path to the repository cache directory.
/// Uses $XDG_CACHE_HOME/chart-index/repository if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/chart-index/repository,
/// or ./chart-index/repository if neither is available.
pub fn cache_dir() -> PathBuf {
    base_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir()).join("repository")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    base_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
        .join("chart-index.log")
}

fn base_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join("chart-index")
}
