//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use hst2csv_core::{HistoryHeader, RateInfo};

pub fn header() -> HistoryHeader {
    let mut h = HistoryHeader::new(400, "(C)opyright 2003, MetaQuotes Software Corp.", "EURUSD", 1, 5);
    h.timesign = 1_262_304_000;
    h.last_sync = 1_262_307_600;
    h
}

pub fn rate(ctm: u32, open: f64, low: f64, high: f64, close: f64, vol: f64) -> RateInfo {
    RateInfo {
        ctm,
        open,
        low,
        high,
        close,
        vol,
    }
}

/// Deterministic minute bars starting at 2010-01-01 00:00:00 UTC.
pub fn minute_bars(n: u32) -> Vec<RateInfo> {
    (0..n)
        .map(|i| {
            let p = 1.4 + f64::from(i % 977) * 0.0001;
            rate(1_262_304_000 + i * 60, p, p - 0.0003, p + 0.0004, p + 0.0001, f64::from(i % 50 + 1))
        })
        .collect()
}

pub fn archive(h: &HistoryHeader, rates: &[RateInfo]) -> Vec<u8> {
    let mut bytes = h.to_bytes().to_vec();
    for r in rates {
        bytes.extend_from_slice(&r.to_bytes());
    }
    bytes
}
