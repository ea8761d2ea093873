//! Run-level errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::DecodeError;
use crate::sink::SinkError;

/// Everything that can make a conversion fail.
///
/// The two open failures happen before any worker starts and leave no
/// partial output behind.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed open file: {}", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed create file: {}", .path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid header: {0}")]
    Header(#[from] DecodeError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed reading records: {0}")]
    Read(#[source] io::Error),

    #[error("failed rendering chunk {index}: {source}")]
    Render {
        index: u64,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Write(#[from] SinkError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("worker thread panicked")]
    WorkerPanicked,
}
