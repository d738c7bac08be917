//! Message framing over byte streams.
//!
//! Responsibilities:
//! - Length-prefixed (uvarint) framing
//! - Newline-delimited framing
//! - Mutex-guarded writer for several producers
//!
//! Non-responsibilities:
//! - Payload semantics (frames are opaque bytes)
//! - Chunking and parallelism

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    FrameError,
    FrameReader,
    FrameWriter,
    Frames,
    NewlineReaderConfig,
};
pub use encode::{
    encode_uvarint,
    ConcurrentFrameWriter,
    NewlineDelimitedFrameWriter,
    VarLenFrameWriter,
};
pub use decode::{
    read_uvarint,
    NewlineDelimitedFrameReader,
    VarLenFrameReader,
};
