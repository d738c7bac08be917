//! streamframe-core
//!
//! Pure Rust message framing over byte streams: length-prefixed and
//! newline-delimited codecs, boundary-aligned chunking, reader composition
//! and explicit close ordering for layered sinks.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::stream::chunking::{Chunk, ChunkReader, ChunkerConfig, DelimitedChunker};
    pub use crate::stream::framing::{
        ConcurrentFrameWriter, FrameError, FrameReader, FrameWriter,
        NewlineDelimitedFrameReader, NewlineDelimitedFrameWriter, VarLenFrameReader,
        VarLenFrameWriter,
    };
    pub use crate::stream::io::{BufferedWriteCloser, ChainedCloser, Close, SafeCloser};
    pub use crate::stream::{
        decode_chunks_parallel, read_all_frames, MultiFrameReader, ParallelismProfile,
        SliceFrameReader,
    };
    pub use crate::types::StreamError;
}
