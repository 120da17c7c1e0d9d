//! Model options loadable from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use logweave_types::DedupStrategy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Applied after identity resolution
    pub dedup_strategy: DedupStrategy,
    pub resolve_identities: bool,
    pub volume: VolumeConfig,
}

/// Bucket sizing for the synthesized volume histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Bucket size as a multiple of the query interval, wide enough that
    /// buckets render as bars
    pub bars_per_interval: i64,
    /// Lower bound on bucket size; 0 disables it
    pub min_bucket_ms: i64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dedup_strategy: DedupStrategy::None,
            resolve_identities: true,
            volume: VolumeConfig::default(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            bars_per_interval: 10,
            min_bucket_ms: 0,
        }
    }
}

impl ModelConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded model config");
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_dedup_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.dedup_strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volume.bars_per_interval <= 0 {
            return Err(ConfigError::Invalid(
                "volume.bars_per_interval must be > 0".to_string(),
            ));
        }
        if self.volume.min_bucket_ms < 0 {
            return Err(ConfigError::Invalid(
                "volume.min_bucket_ms must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl VolumeConfig {
    /// Bucket width for a query interval. None when the interval is absent or
    /// not positive.
    pub fn bucket_size(&self, interval_ms: Option<i64>) -> Option<i64> {
        let interval = interval_ms.filter(|i| *i > 0)?;
        let size = interval
            .saturating_mul(self.bars_per_interval)
            .max(self.min_bucket_ms);
        (size > 0).then_some(size)
    }
}
