use std::io;

use crate::stream::{chunking::ChunkError, framing::FrameError, io::CloseChainError};

/// Unified stream error covering I/O, framing, chunking, close chains and the
/// parallel pipeline.
/// - `From<T>` impls enable `?` across layers.
/// - Messages are stable so they can be matched in logs.
#[derive(Debug)]
pub enum StreamError {
    /// I/O error outside of a frame codec.
    Io(io::Error),

    /// Frame-level error (codec or limits).
    Frame(FrameError),

    /// Chunk-level error (configuration or missing boundary).
    Chunk(ChunkError),

    /// A step of a close chain failed.
    Close(CloseChainError),

    /// Pipeline bookkeeping error (duplicate or missing chunk).
    Pipeline(String),

    /// A pipeline thread panicked.
    Panicked(&'static str),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Frame(e) => write!(f, "frame error: {}", e),
            StreamError::Chunk(e) => write!(f, "chunk error: {}", e),
            StreamError::Close(e) => write!(f, "close error: {}", e),
            StreamError::Pipeline(msg) => write!(f, "pipeline error: {}", msg),
            StreamError::Panicked(who) => write!(f, "{} thread panicked", who),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Frame(e) => Some(e),
            StreamError::Chunk(e) => Some(e),
            StreamError::Close(e) => Some(e),
            StreamError::Pipeline(_) | StreamError::Panicked(_) => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<FrameError> for StreamError {
    fn from(e: FrameError) -> Self {
        StreamError::Frame(e)
    }
}

impl From<ChunkError> for StreamError {
    fn from(e: ChunkError) -> Self {
        StreamError::Chunk(e)
    }
}

impl From<CloseChainError> for StreamError {
    fn from(e: CloseChainError) -> Self {
        StreamError::Close(e)
    }
}
