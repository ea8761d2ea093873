//! Pipeline orchestrator — header, worker pool, ordered output.
//!
//! Lifecycle of one run:
//! 1. Open source and destination (file entry point only). Failure here is
//!    fatal and no worker is spawned.
//! 2. Read the header and hand it to the observer, exactly once.
//! 3. Start N symmetric workers. Each loops: acquire chunk, render it,
//!    submit it to the ordered sink, add its byte count to the total.
//! 4. Join every worker, flush the destination, report a [`RunSummary`].
//!
//! Any worker error closes the source and aborts the sink so the remaining
//! workers drain instead of waiting on a turn that will never come.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::decode::{render_chunk, TimestampStyle};
use crate::domain::HistoryHeader;
use crate::error::ConvertError;
use crate::sink::{OrderedSink, SinkError, Submission};
use crate::source::{ChunkSource, RawChunk};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub header: HistoryHeader,
    pub workers: usize,
    pub chunks: u64,
    pub records: u64,
    /// Raw record-section bytes read, including any trailing partial record.
    pub bytes_read: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConvertError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert the file at `src` into `dst`, truncating `dst` first.
    pub fn convert_file<F>(
        &self,
        src: &Path,
        dst: &Path,
        on_header: F,
    ) -> Result<RunSummary, ConvertError>
    where
        F: FnOnce(HistoryHeader),
    {
        let input = File::open(src).map_err(|source| ConvertError::OpenSource {
            path: src.to_path_buf(),
            source,
        })?;
        let output = File::create(dst).map_err(|source| ConvertError::CreateDestination {
            path: dst.to_path_buf(),
            source,
        })?;
        self.run(input, BufWriter::new(output), on_header)
    }

    /// Convert an already-open source into `dest`.
    pub fn run<R, W, F>(
        &self,
        mut source: R,
        dest: W,
        on_header: F,
    ) -> Result<RunSummary, ConvertError>
    where
        R: Read + Send,
        W: Write + Send,
        F: FnOnce(HistoryHeader),
    {
        let started = Instant::now();
        let chunk_bytes = self.config.chunk_bytes()?;

        let header = HistoryHeader::read_from(&mut source)?;
        on_header(header.clone());

        let workers = self.config.worker_count();
        info!(
            symbol = %header.symbol_str(),
            period = header.period,
            workers,
            chunk_bytes,
            "starting conversion"
        );

        let chunks = ChunkSource::new(source, chunk_bytes);
        let sink = OrderedSink::new(dest);
        let totals = Totals::default();
        let style = self.config.timestamps;

        let outcomes: Vec<Result<(), ConvertError>> = thread::scope(|s| {
            let ctx = Worker {
                chunks: &chunks,
                sink: &sink,
                totals: &totals,
                style,
            };

            let mut handles = Vec::with_capacity(workers);
            let mut outcomes = Vec::new();
            for id in 0..workers {
                let spawned = thread::Builder::new()
                    .name(format!("hst2csv-worker-{id}"))
                    .spawn_scoped(s, move || ctx.run());
                match spawned {
                    Ok(h) => handles.push(h),
                    Err(e) => {
                        ctx.shut_down();
                        outcomes.push(Err(ConvertError::Spawn(e)));
                        break;
                    }
                }
            }
            for h in handles {
                outcomes.push(h.join().unwrap_or(Err(ConvertError::WorkerPanicked)));
            }
            outcomes
        });

        if let Some(err) = first_error(outcomes) {
            return Err(err);
        }
        sink.into_inner()?;

        let summary = RunSummary {
            header,
            workers,
            chunks: chunks.chunks_issued(),
            records: totals.records.load(Ordering::Relaxed),
            bytes_read: totals.bytes_read.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        };
        info!(
            chunks = summary.chunks,
            records = summary.records,
            bytes = summary.bytes_read,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "conversion finished"
        );
        Ok(summary)
    }
}

#[derive(Debug, Default)]
struct Totals {
    bytes_read: AtomicU64,
    records: AtomicU64,
}

/// Shared borrows every worker loops over.
struct Worker<'a, R, W> {
    chunks: &'a ChunkSource<R>,
    sink: &'a OrderedSink<W>,
    totals: &'a Totals,
    style: TimestampStyle,
}

impl<R, W> Clone for Worker<'_, R, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, W> Copy for Worker<'_, R, W> {}

impl<R: Read + Send, W: Write + Send> Worker<'_, R, W> {
    fn run(self) -> Result<(), ConvertError> {
        let _guard = ShutDownOnPanic(self);
        let result = self.drain();
        if let Err(e) = &result {
            warn!(error = %e, "worker failed, shutting pipeline down");
            self.shut_down();
        }
        result
    }

    fn drain(&self) -> Result<(), ConvertError> {
        let mut chunk = RawChunk::default();
        while self.chunks.acquire(&mut chunk).map_err(ConvertError::Read)? {
            let rendered = render_chunk(&chunk.data, self.style).map_err(|source| {
                ConvertError::Render {
                    index: chunk.index,
                    source,
                }
            })?;
            if self.sink.submit(chunk.index, &rendered.bytes)? == Submission::Discarded {
                debug!(index = chunk.index, "chunk discarded by sink");
                continue;
            }
            self.totals
                .bytes_read
                .fetch_add(chunk.len() as u64, Ordering::Relaxed);
            self.totals
                .records
                .fetch_add(rendered.records, Ordering::Relaxed);
        }
        Ok(())
    }

    fn shut_down(&self) {
        self.chunks.close();
        self.sink.abort();
    }
}

/// Keeps a panicking worker from stranding the others at the sink.
struct ShutDownOnPanic<'a, R: Read + Send, W: Write + Send>(Worker<'a, R, W>);

impl<R: Read + Send, W: Write + Send> Drop for ShutDownOnPanic<'_, R, W> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.shut_down();
        }
    }
}

/// The root cause wins over the aborts it triggered in other workers.
fn first_error(outcomes: Vec<Result<(), ConvertError>>) -> Option<ConvertError> {
    let mut fallback = None;
    for err in outcomes.into_iter().filter_map(Result::err) {
        match err {
            ConvertError::Write(SinkError::Aborted(_)) => {
                fallback.get_or_insert(err);
            }
            other => return Some(other),
        }
    }
    fallback
}
