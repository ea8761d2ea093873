//! RateInfo — one packed price/volume sample.

/// Size of one packed record: `u32` time plus five `f64` fields.
pub const RECORD_SIZE: usize = 4 + 8 * 5;

/// A single timestamped OHLCV sample as stored on disk.
///
/// Field order follows the file layout (open, low, high, close), not the
/// conventional OHLC order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateInfo {
    /// Bar open time, seconds since the Unix epoch.
    pub ctm: u32,
    pub open: f64,
    pub low: f64,
    pub high: f64,
    pub close: f64,
    pub vol: f64,
}

impl RateInfo {
    pub fn from_bytes(raw: &[u8; RECORD_SIZE]) -> Self {
        let f = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&raw[at..at + 8]);
            f64::from_le_bytes(b)
        };
        Self {
            ctm: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            open: f(4),
            low: f(12),
            high: f(20),
            close: f(28),
            vol: f(36),
        }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..4].copy_from_slice(&self.ctm.to_le_bytes());
        for (i, v) in [self.open, self.low, self.high, self.close, self.vol]
            .iter()
            .enumerate()
        {
            let at = 4 + i * 8;
            out[at..at + 8].copy_from_slice(&v.to_le_bytes());
        }
        out
    }
}
