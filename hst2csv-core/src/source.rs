//! ChunkSource — hands out sequentially numbered slices of the record section.
//!
//! Index assignment and the physical read happen under the same lock, so
//! chunk `i` is always the `i`-th contiguous slice of the input no matter
//! which worker asks first. This lock is the only serialization on the read
//! side; decoding happens outside it.
//!
//! Each worker owns one [`RawChunk`] and passes it back in on every call.
//! The buffer is sized outside the lock, once, and refilled in place.

use std::io::{self, Read};
use std::sync::Mutex;

use tracing::debug;

/// Raw record bytes tagged with their position in the input.
///
/// Reused across [`ChunkSource::acquire`] calls; `data` holds only the bytes
/// of the most recent chunk.
#[derive(Debug, Default)]
pub struct RawChunk {
    pub index: u64,
    pub data: Vec<u8>,
}

impl RawChunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug)]
struct SourceState<R> {
    reader: R,
    next_index: u64,
    exhausted: bool,
}

/// Concurrent chunk dispenser over a sequential reader.
#[derive(Debug)]
pub struct ChunkSource<R> {
    state: Mutex<SourceState<R>>,
    chunk_bytes: usize,
}

impl<R: Read + Send> ChunkSource<R> {
    /// `chunk_bytes` is the maximum size of each chunk; callers pick a
    /// multiple of the record size so records never straddle chunks.
    pub fn new(reader: R, chunk_bytes: usize) -> Self {
        assert!(chunk_bytes > 0, "chunk size must be non-zero");
        Self {
            state: Mutex::new(SourceState {
                reader,
                next_index: 0,
                exhausted: false,
            }),
            chunk_bytes,
        }
    }

    /// Fill `chunk` with the next slice of input. Returns `false` once the
    /// input is used up, leaving `chunk.data` empty.
    ///
    /// After the first `false` (or the first error) every later call returns
    /// `false` without touching the buffer. A buffer that cannot be sized is
    /// an [`io::ErrorKind::OutOfMemory`] error, not an abort.
    pub fn acquire(&self, chunk: &mut RawChunk) -> io::Result<bool> {
        if self.lock().exhausted {
            chunk.data.clear();
            return Ok(false);
        }
        if let Err(e) = size_buffer(&mut chunk.data, self.chunk_bytes) {
            self.close();
            return Err(e);
        }

        let mut state = self.lock();
        if state.exhausted {
            chunk.data.clear();
            return Ok(false);
        }

        let filled = match fill(&mut state.reader, &mut chunk.data) {
            Ok(n) => n,
            Err(e) => {
                state.exhausted = true;
                chunk.data.clear();
                return Err(e);
            }
        };

        if filled < self.chunk_bytes {
            state.exhausted = true;
        }
        chunk.data.truncate(filled);
        if filled == 0 {
            return Ok(false);
        }

        chunk.index = state.next_index;
        state.next_index += 1;
        debug!(index = chunk.index, bytes = filled, "acquired chunk");
        Ok(true)
    }

    /// Stop handing out chunks.
    pub fn close(&self) {
        self.lock().exhausted = true;
    }

    /// Number of chunks handed out so far.
    pub fn chunks_issued(&self) -> u64 {
        self.lock().next_index
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SourceState<R>> {
        // A panic while holding the lock cannot leave the counters torn.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Grow `buf` to exactly `len` bytes. Only the first call per buffer
/// allocates; stale bytes are overwritten by the next fill.
fn size_buffer(buf: &mut Vec<u8>, len: usize) -> io::Result<()> {
    if buf.len() < len {
        buf.try_reserve_exact(len - buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        buf.resize(len, 0);
    }
    buf.truncate(len);
    Ok(())
}

/// Read until `buf` is full or the reader hits EOF.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
