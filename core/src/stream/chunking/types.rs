use std::io::{self, Cursor};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_LINE_LEN, MAX_CHUNK_SIZE};
use crate::stream::compose::read_all_frames;
use crate::stream::framing::{FrameError, NewlineDelimitedFrameReader, NewlineReaderConfig};

/// Decode cursor handed out for a single chunk.
pub type ChunkFrameReader = NewlineDelimitedFrameReader<Cursor<Bytes>>;

/// Breaks a stream into chunks amenable to parallel decoding.
pub trait ChunkReader {
    /// Next boundary-aligned chunk, or `Ok(None)` once the source is drained.
    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError>;
}

impl<T: ChunkReader + ?Sized> ChunkReader for &mut T {
    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        (**self).next_chunk()
    }
}

impl<T: ChunkReader + ?Sized> ChunkReader for Box<T> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        (**self).next_chunk()
    }
}

/// A contiguous, boundary-aligned slice of a newline-delimited stream.
///
/// Owns its bytes, so it can be moved to another thread and decoded there
/// with no shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: u64,
    bytes: Bytes,
    max_line_len: usize,
}

impl Chunk {
    pub(crate) fn new(index: u64, bytes: Bytes, max_line_len: usize) -> Self {
        Self { index, bytes, max_line_len }
    }

    /// Position of the chunk in production order, starting at 0.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A fresh cursor over this chunk's frames. Empty lines are skipped.
    pub fn frame_reader(&self) -> ChunkFrameReader {
        self.clone().into_frame_reader()
    }

    pub fn into_frame_reader(self) -> ChunkFrameReader {
        let config = NewlineReaderConfig {
            max_line_len: self.max_line_len,
            skip_empty: true,
        };
        NewlineDelimitedFrameReader::with_config(Cursor::new(self.bytes), config)
    }

    /// Decode every frame of the chunk.
    pub fn decode(&self) -> Result<Vec<Bytes>, FrameError> {
        read_all_frames(&mut self.frame_reader())
    }
}

/// Chunker settings. The delimiter is always `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Raw bytes read per chunk, at most [`MAX_CHUNK_SIZE`]. Must be at least
    /// the longest frame.
    pub chunk_size: usize,
    /// Line limit of the per-chunk decode cursors.
    pub max_line_len: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ChunkerConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ChunkError::InvalidChunkSize(self.chunk_size));
        }
        if self.max_line_len == 0 {
            return Err(ChunkError::InvalidMaxLineLen(self.max_line_len));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("invalid argument: chunk size must be between 1 byte and 1 GiB, got {0}")]
    InvalidChunkSize(usize),

    #[error("invalid argument: max line length must be positive, got {0}")]
    InvalidMaxLineLen(usize),

    /// A full-size read held no delimiter: some frame is longer than the chunk size.
    #[error("no frame boundary found in a {chunk_size}-byte chunk")]
    NoFrameBoundary { chunk_size: usize },

    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}
