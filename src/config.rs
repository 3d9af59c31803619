// Orchestrator configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CACHE_SUBDIR: &str = "ytdl-orchestrator/metadata";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for extraction, caching and downloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YtdlConfig {
    /// Extractor executable; discovered when unset
    pub extractor_path: Option<PathBuf>,
    /// Turn the metadata cache into a pass-through when false
    pub cache_enabled: bool,
    /// Directory holding one JSON file per cached link
    pub cache_dir: PathBuf,
    /// Maximum cache entry age in seconds
    pub cache_ttl_secs: u64,
    /// Upper bound on every extractor invocation, in seconds
    pub timeout_secs: u64,
    /// Format selector applied when the options carry none
    pub default_format: String,
    /// Directory for per-entry info files; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for YtdlConfig {
    fn default() -> Self {
        Self {
            extractor_path: None,
            cache_enabled: true,
            cache_dir: default_cache_dir(),
            cache_ttl_secs: 24 * 60 * 60,
            timeout_secs: 30 * 60,
            default_format: "best".to_string(),
            temp_dir: None,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_SUBDIR)
}

impl YtdlConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_extractor_path(mut self, path: Option<PathBuf>) -> Self {
        self.extractor_path = path;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_ttl(mut self, seconds: u64) -> Self {
        self.cache_ttl_secs = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = format.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }
}
