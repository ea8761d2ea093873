//! Record decoding and CSV rendering.
//!
//! A chunk is decoded independently of every other chunk: walk the buffer at
//! [`RECORD_SIZE`] stride, turn each record into one text line. A trailing
//! partial record is dropped silently.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RateInfo, RECORD_SIZE};

/// `YYYY/MM/DD HH:MM:SS`
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Which clock record timestamps are rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// Local time of the converting machine.
    #[default]
    Local,
    Utc,
}

impl TimestampStyle {
    /// Format epoch seconds with [`TIME_FORMAT`].
    pub fn format(self, secs: u32) -> String {
        match self {
            TimestampStyle::Local => format_in(&Local, secs),
            TimestampStyle::Utc => format_in(&Utc, secs),
        }
    }
}

fn format_in<Tz: TimeZone>(tz: &Tz, secs: u32) -> String
where
    Tz::Offset: std::fmt::Display,
{
    // A u32 epoch is always in chrono's range; only a DST fold can make it
    // ambiguous, in which case the earlier instant wins.
    let dt: Option<DateTime<Tz>> = tz.timestamp_opt(i64::from(secs), 0).earliest();
    match dt {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Iterate the complete records in `buf`.
pub fn decode_records(buf: &[u8]) -> impl Iterator<Item = RateInfo> + '_ {
    buf.chunks_exact(RECORD_SIZE).map(|raw| {
        let mut rec = [0u8; RECORD_SIZE];
        rec.copy_from_slice(raw);
        RateInfo::from_bytes(&rec)
    })
}

/// Text rendered from one chunk, plus how many records it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedText {
    pub bytes: Vec<u8>,
    pub records: u64,
}

/// Render every complete record in `buf` as one CSV line.
///
/// Numbers use the shortest representation that round-trips to the stored
/// `f64`, so nothing is rounded away.
pub fn render_chunk(buf: &[u8], style: TimestampStyle) -> csv::Result<RenderedText> {
    let estimate = (buf.len() / RECORD_SIZE) * 64;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(estimate));

    let mut records = 0u64;
    for r in decode_records(buf) {
        wtr.write_record([
            style.format(r.ctm),
            r.open.to_string(),
            r.low.to_string(),
            r.high.to_string(),
            r.close.to_string(),
            r.vol.to_string(),
        ])?;
        records += 1;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(RenderedText { bytes, records })
}
