//! Boundary-aligned chunking of newline-delimited streams.
//!
//! Every chunk ends on a frame delimiter (except possibly the last one) and
//! owns its bytes, so chunks can be decoded by independent workers.

pub mod types;
pub mod splitter;

pub use types::{
    Chunk,
    ChunkError,
    ChunkFrameReader,
    ChunkReader,
    ChunkerConfig,
};
pub use splitter::{
    read_all_chunks,
    DelimitedChunker,
};
