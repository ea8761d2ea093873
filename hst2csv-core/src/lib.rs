//! hst2csv core — parallel, order-preserving HST to CSV conversion.
//!
//! This crate contains the conversion pipeline:
//! - Fixed binary layouts (header, packed rate records)
//! - Chunk source: sequentially numbered slices of the record section
//! - Record decoder: one CSV line per record
//! - Ordered sink: writes rendered chunks strictly in input order
//! - Orchestrator: worker pool, header observer, run summary

pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use config::{ConfigError, PipelineConfig};
pub use decode::{render_chunk, TimestampStyle, TIME_FORMAT};
pub use domain::{HistoryHeader, RateInfo, HEADER_SIZE, RECORD_SIZE};
pub use error::ConvertError;
pub use pipeline::{Pipeline, RunSummary};
