//! Parallel decoding of chunks, wiring only.
//!
//! ```text
//! splitter thread ──chunks──▶ N decode workers ──results──▶ ordered collector
//! ```
//!
//! Both channels are bounded by `inflight_chunks`, which caps memory to
//! roughly `2 * inflight_chunks * chunk_size`.

use std::collections::BTreeMap;
use std::thread;

use bytes::Bytes;
use crossbeam::channel::bounded;
use tracing::{debug, warn};

use crate::stream::chunking::{Chunk, ChunkReader};
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::DecodeCounters;
use crate::types::StreamError;

/// Frames of one chunk, tagged with the chunk's production index.
#[derive(Debug, Clone)]
pub struct DecodedChunk {
    pub index: u64,
    pub frames: Vec<Bytes>,
    pub counters: DecodeCounters,
}

/// All frames of a stream, in stream order.
#[derive(Debug, Clone, Default)]
pub struct DecodedStream {
    pub frames: Vec<Bytes>,
    pub counters: DecodeCounters,
}

/// Decode a single chunk on the calling thread.
pub fn decode_chunk(chunk: &Chunk) -> Result<DecodedChunk, StreamError> {
    let frames = chunk.decode()?;
    let mut counters = DecodeCounters::default();
    counters.add_chunk(chunk.len(), &frames);
    Ok(DecodedChunk {
        index: chunk.index(),
        frames,
        counters,
    })
}

/// Reassembles decoded chunks in production order, whatever order workers
/// finish in.
#[derive(Debug, Default)]
pub struct OrderedFrameCollector {
    next: u64,
    pending: BTreeMap<u64, DecodedChunk>,
    frames: Vec<Bytes>,
    counters: DecodeCounters,
}

impl OrderedFrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: DecodedChunk) -> Result<(), StreamError> {
        if chunk.index < self.next || self.pending.contains_key(&chunk.index) {
            return Err(StreamError::Pipeline(format!("duplicate chunk {}", chunk.index)));
        }
        self.pending.insert(chunk.index, chunk);
        self.flush_ready();
        Ok(())
    }

    /// Chunks received ahead of a missing predecessor.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn finish(mut self) -> Result<DecodedStream, StreamError> {
        self.flush_ready();
        if !self.pending.is_empty() {
            return Err(StreamError::Pipeline(format!("missing chunk {}", self.next)));
        }
        Ok(DecodedStream {
            frames: self.frames,
            counters: self.counters,
        })
    }

    fn flush_ready(&mut self) {
        while let Some(chunk) = self.pending.remove(&self.next) {
            self.counters.merge(&chunk.counters);
            self.frames.extend(chunk.frames);
            self.next += 1;
        }
    }
}

/// Split `chunker`'s stream and decode the chunks on `profile.worker_count`
/// threads, returning the frames in stream order.
///
/// The first failure (splitting or decoding) aborts the run; frames decoded
/// so far are discarded.
pub fn decode_chunks_parallel<C>(
    chunker: C,
    profile: &ParallelismProfile,
) -> Result<DecodedStream, StreamError>
where
    C: ChunkReader + Send,
{
    decode_chunks_parallel_with(chunker, profile, decode_chunk)
}

/// [`decode_chunks_parallel`] with a caller-supplied per-chunk decoder.
///
/// A panic in the splitter or in a worker surfaces as
/// [`StreamError::Panicked`].
pub fn decode_chunks_parallel_with<C, F>(
    mut chunker: C,
    profile: &ParallelismProfile,
    decode: F,
) -> Result<DecodedStream, StreamError>
where
    C: ChunkReader + Send,
    F: Fn(&Chunk) -> Result<DecodedChunk, StreamError> + Sync,
{
    let profile = ParallelismProfile::new(profile.worker_count, profile.inflight_chunks);
    debug!(
        workers = profile.worker_count,
        inflight = profile.inflight_chunks,
        "decode pipeline start"
    );

    let (chunk_tx, chunk_rx) = bounded::<Chunk>(profile.inflight_chunks);
    let (out_tx, out_rx) = bounded::<Result<DecodedChunk, StreamError>>(profile.inflight_chunks);
    let decode = &decode;

    thread::scope(|scope| {
        // ---- Splitter ----
        let splitter = scope.spawn(move || -> Result<(), StreamError> {
            while let Some(chunk) = chunker.next_chunk()? {
                if chunk_tx.send(chunk).is_err() {
                    return Err(StreamError::Pipeline(
                        "decode workers exited before the stream was drained".into(),
                    ));
                }
            }
            Ok(())
        });

        // ---- Workers ----
        let workers: Vec<_> = (0..profile.worker_count)
            .map(|worker_id| {
                let rx = chunk_rx.clone();
                let tx = out_tx.clone();
                scope.spawn(move || {
                    debug!(worker_id, "decode worker starting");
                    for chunk in rx.iter() {
                        if tx.send(decode(&chunk)).is_err() {
                            break;
                        }
                    }
                    debug!(worker_id, "decode worker finished");
                })
            })
            .collect();
        drop(chunk_rx);
        drop(out_tx);

        // ---- Ordered collector ----
        let mut collector = OrderedFrameCollector::new();
        let mut failure = None;
        for result in out_rx.iter() {
            if let Err(e) = result.and_then(|chunk| collector.push(chunk)) {
                failure = Some(e);
                break;
            }
        }
        // unblocks workers, which in turn unblock the splitter
        drop(out_rx);

        let split = splitter.join();
        let worker_panicked = workers
            .into_iter()
            .map(|worker| worker.join())
            .fold(false, |panicked, joined| panicked || joined.is_err());

        let split = split.map_err(|_| StreamError::Panicked("chunk splitter"))?;
        if worker_panicked {
            warn!("decode worker panicked");
            return Err(StreamError::Panicked("decode worker"));
        }
        if let Some(e) = failure {
            warn!(error = %e, "decode pipeline aborted");
            return Err(e);
        }
        if let Err(e) = split {
            warn!(error = %e, "decode pipeline aborted");
            return Err(e);
        }

        let decoded = collector.finish()?;
        debug!(
            chunks = decoded.counters.chunks,
            frames = decoded.counters.frames,
            "decode pipeline finished"
        );
        Ok(decoded)
    })
}
