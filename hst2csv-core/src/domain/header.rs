//! HistoryHeader — the fixed metadata block at the start of an HST file.

use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use thiserror::Error;

/// Size of the on-disk header in bytes.
pub const HEADER_SIZE: usize = 148;

const COPYRIGHT_LEN: usize = 64;
const SYMBOL_LEN: usize = 12;
const UNUSED_LEN: usize = 13;

/// Errors from decoding fixed-layout blocks.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("header needs 148 bytes, got {0}")]
    ShortHeader(usize),

    #[error("failed to read header: {0}")]
    Io(#[from] io::Error),
}

/// Archive metadata, decoded from the first [`HEADER_SIZE`] bytes.
///
/// Text fields keep their raw fixed-width bytes so the header can be written
/// back out unchanged; use [`copyright_str`](Self::copyright_str) and
/// [`symbol_str`](Self::symbol_str) for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryHeader {
    pub version: i32,
    #[serde(with = "fixed_text")]
    pub copyright: [u8; COPYRIGHT_LEN],
    #[serde(with = "fixed_text")]
    pub symbol: [u8; SYMBOL_LEN],
    pub period: i32,
    pub digits: i32,
    /// Creation time, seconds since the Unix epoch.
    pub timesign: u32,
    /// Last synchronization time, seconds since the Unix epoch.
    pub last_sync: u32,
    #[serde(skip, default = "zeroed_unused")]
    pub unused: [i32; UNUSED_LEN],
}

fn zeroed_unused() -> [i32; UNUSED_LEN] {
    [0; UNUSED_LEN]
}

impl HistoryHeader {
    /// Build a header with the given identity and zeroed padding.
    pub fn new(version: i32, copyright: &str, symbol: &str, period: i32, digits: i32) -> Self {
        Self {
            version,
            copyright: pack_text(copyright),
            symbol: pack_text(symbol),
            period,
            digits,
            timesign: 0,
            last_sync: 0,
            unused: zeroed_unused(),
        }
    }

    /// Decode a header from the leading bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DecodeError::ShortHeader(bytes.len()));
        }
        let mut cur = Cursor { bytes, pos: 0 };

        let version = cur.i32();
        let copyright = cur.array::<COPYRIGHT_LEN>();
        let symbol = cur.array::<SYMBOL_LEN>();
        let period = cur.i32();
        let digits = cur.i32();
        let timesign = cur.u32();
        let last_sync = cur.u32();
        let mut unused = zeroed_unused();
        for slot in unused.iter_mut() {
            *slot = cur.i32();
        }
        debug_assert_eq!(cur.pos, HEADER_SIZE);

        Ok(Self {
            version,
            copyright,
            symbol,
            period,
            digits,
            timesign,
            last_sync,
            unused,
        })
    }

    /// Read exactly one header from `reader`.
    ///
    /// A source that ends before [`HEADER_SIZE`] bytes is a
    /// [`DecodeError::ShortHeader`], not an I/O error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(DecodeError::ShortHeader(filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Self::from_bytes(&buf)
    }

    /// Encode back into the on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut pos = 0;
        let mut put = |chunk: &[u8]| {
            out[pos..pos + chunk.len()].copy_from_slice(chunk);
            pos += chunk.len();
        };
        put(&self.version.to_le_bytes());
        put(&self.copyright);
        put(&self.symbol);
        put(&self.period.to_le_bytes());
        put(&self.digits.to_le_bytes());
        put(&self.timesign.to_le_bytes());
        put(&self.last_sync.to_le_bytes());
        for v in &self.unused {
            put(&v.to_le_bytes());
        }
        out
    }

    pub fn copyright_str(&self) -> String {
        text_field(&self.copyright)
    }

    pub fn symbol_str(&self) -> String {
        text_field(&self.symbol)
    }
}

/// Little-endian reader over a slice already known to be long enough.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.array::<4>())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array::<4>())
    }
}

/// Text up to the first NUL, lossily decoded.
fn text_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Truncate or NUL-pad `s` into a fixed-width field.
fn pack_text<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let n = s.len().min(N);
    out[..n].copy_from_slice(&s.as_bytes()[..n]);
    out
}

/// Serde adapter: fixed-width byte fields travel as trimmed strings.
mod fixed_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        raw: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::text_field(raw))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(super::pack_text(&s))
    }
}
