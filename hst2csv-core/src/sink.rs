//! OrderedSink — writes tagged chunks to the destination strictly in index order.
//!
//! Callers submit from any thread in any order. A submission whose index is
//! ahead of the write pointer blocks until every lower index has been written;
//! the pointer advances by exactly one after each write and wakes the waiters.
//!
//! Turn-taking and the destination writer are guarded by separate locks. Only
//! the caller holding the current turn ever touches the writer, so writes
//! never interleave.
//!
//! # Example
//!
//! ```
//! use hst2csv_core::sink::OrderedSink;
//!
//! let mut out = Vec::new();
//! let sink = OrderedSink::new(&mut out);
//! std::thread::scope(|s| {
//!     s.spawn(|| sink.submit(1, b"second\n").unwrap());
//!     s.spawn(|| sink.submit(0, b"first\n").unwrap());
//! });
//! sink.into_inner().unwrap();
//! assert_eq!(out, b"first\nsecond\n");
//! ```

use std::io::{self, Write};
use std::sync::{Condvar, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink was aborted before chunk {0} could be written")]
    Aborted(u64),

    #[error("failed writing chunk {index}: {source}")]
    Io {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed flushing destination: {0}")]
    Flush(#[source] io::Error),
}

/// What happened to a submitted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Written,
    /// The index was already behind the write pointer. Never expected when
    /// every index is issued exactly once.
    Discarded,
}

#[derive(Debug, Default)]
struct Turn {
    next: u64,
    aborted: bool,
}

#[derive(Debug)]
pub struct OrderedSink<W> {
    turn: Mutex<Turn>,
    advanced: Condvar,
    writer: Mutex<W>,
}

impl<W: Write + Send> OrderedSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            turn: Mutex::new(Turn::default()),
            advanced: Condvar::new(),
            writer: Mutex::new(writer),
        }
    }

    /// Write `bytes` as chunk `index`, waiting for all earlier chunks first.
    pub fn submit(&self, index: u64, bytes: &[u8]) -> Result<Submission, SinkError> {
        let mut turn = self.lock_turn();
        if index < turn.next {
            warn!(index, next = turn.next, "discarding stale chunk");
            return Ok(Submission::Discarded);
        }
        while turn.next != index && !turn.aborted {
            turn = self
                .advanced
                .wait(turn)
                .unwrap_or_else(|e| e.into_inner());
        }
        if turn.aborted {
            return Err(SinkError::Aborted(index));
        }
        drop(turn);

        let written = self.lock_writer().write_all(bytes);
        if let Err(source) = written {
            self.abort();
            return Err(SinkError::Io { index, source });
        }

        let mut turn = self.lock_turn();
        turn.next += 1;
        drop(turn);
        self.advanced.notify_all();
        debug!(index, bytes = bytes.len(), "wrote chunk");
        Ok(Submission::Written)
    }

    /// Fail every pending and future submission.
    pub fn abort(&self) {
        let mut turn = self.lock_turn();
        if !turn.aborted {
            warn!(next = turn.next, "aborting ordered sink");
            turn.aborted = true;
        }
        drop(turn);
        self.advanced.notify_all();
    }

    /// Index of the next chunk allowed to write.
    pub fn next_index(&self) -> u64 {
        self.lock_turn().next
    }

    /// Flush and hand back the destination.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let mut writer = self.writer.into_inner().unwrap_or_else(|e| e.into_inner());
        writer.flush().map_err(SinkError::Flush)?;
        Ok(writer)
    }

    fn lock_turn(&self) -> MutexGuard<'_, Turn> {
        self.turn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_writer(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}
