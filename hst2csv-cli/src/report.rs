//! Human-readable header summary printed before conversion.

use hst2csv_core::{HistoryHeader, TimestampStyle};

const RULE: &str = "------------------------------------------";

/// Render the framed header block.
pub fn header_summary(h: &HistoryHeader, style: TimestampStyle) -> String {
    let rows = [
        ("version", h.version.to_string()),
        ("copyright", h.copyright_str()),
        ("symbol", h.symbol_str()),
        ("period", h.period.to_string()),
        ("digits", h.digits.to_string()),
        ("lastSync", style.format(h.last_sync)),
        ("timesign", style.format(h.timesign)),
    ];

    let mut out = String::with_capacity(512);
    out.push_str(RULE);
    out.push('\n');
    for (label, value) in rows {
        out.push_str(&format!("{label:>9}: {value}\n"));
    }
    out.push_str(RULE);
    out.push('\n');
    out
}
