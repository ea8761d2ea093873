//! Pipeline configuration.
//!
//! Every knob has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! workers = 8
//! chunk_records = 131072
//! timestamps = "utc"
//! ```

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

use crate::decode::TimestampStyle;
use crate::domain::RECORD_SIZE;

/// Records per chunk when nothing else is configured (128 Ki).
pub const DEFAULT_CHUNK_RECORDS: usize = 128 * 1024;

/// Upper bound on one chunk buffer. Every worker holds one, so this caps
/// per-worker memory at 256 MiB.
pub const MAX_CHUNK_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk_records must be at least 1")]
    ZeroChunk,

    #[error("chunk of {0} records exceeds the 256 MiB chunk limit")]
    ChunkTooLarge(usize),

    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker thread count; `None` uses the available hardware parallelism.
    pub workers: Option<NonZeroUsize>,
    /// Records decoded per chunk. Chunk byte size is this times 44.
    pub chunk_records: usize,
    pub timestamps: TimestampStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            chunk_records: DEFAULT_CHUNK_RECORDS,
            timestamps: TimestampStyle::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunk_bytes().map(|_| ())
    }

    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_chunk_records(mut self, chunk_records: usize) -> Self {
        self.chunk_records = chunk_records;
        self
    }

    pub fn with_timestamps(mut self, timestamps: TimestampStyle) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }

    /// Chunk size in bytes, always a whole number of records.
    pub fn chunk_bytes(&self) -> Result<usize, ConfigError> {
        if self.chunk_records == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        self.chunk_records
            .checked_mul(RECORD_SIZE)
            .filter(|&bytes| bytes <= MAX_CHUNK_BYTES)
            .ok_or(ConfigError::ChunkTooLarge(self.chunk_records))
    }
}
