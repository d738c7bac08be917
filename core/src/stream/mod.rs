//! Framing, chunking and composition of byte streams.
//!
//! Layers, bottom-up:
//! - `framing`: one frame at a time over `Read`/`Write`
//! - `chunking`: boundary-aligned chunks for independent decoding
//! - `compose`: readers built from other readers
//! - `io`: close ordering for layered sinks
//! - `pipeline`: parallel chunk decoding

pub mod framing;
pub mod chunking;
pub mod compose;
pub mod io;
pub mod parallelism;
pub mod pipeline;

pub use compose::{
    read_all_frames,
    write_all_frames,
    MultiFrameReader,
    SliceFrameReader,
};

pub use parallelism::ParallelismProfile;

pub use pipeline::{
    decode_chunks_parallel,
    decode_chunks_parallel_with,
    DecodedStream,
};
