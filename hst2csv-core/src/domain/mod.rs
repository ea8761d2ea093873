//! Fixed binary layouts of an HST history file.

pub mod header;
pub mod rate;

pub use header::{DecodeError, HistoryHeader, HEADER_SIZE};
pub use rate::{RateInfo, RECORD_SIZE};
