use std::io;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_LINE_LEN;

/// Writes messages (payloads) into a stream and takes care of framing them.
///
/// Implementations give no concurrency guarantees; wrap them in
/// [`ConcurrentFrameWriter`](super::ConcurrentFrameWriter) to share one sink.
pub trait FrameWriter {
    /// Write a single message. Returns the number of bytes the message took
    /// on the wire, framing included.
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError>;

    /// Flush the underlying sink.
    fn flush(&mut self) -> Result<(), FrameError>;
}

/// Reads messages framed in a stream, usually the inverse of a [`FrameWriter`].
///
/// `Ok(None)` is the end-of-stream signal. Once an error has been returned no
/// further frames should be expected from the cursor.
pub trait FrameReader {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError>;

    /// Iterate over the remaining frames.
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames { reader: self, done: false }
    }
}

impl<T: FrameWriter + ?Sized> FrameWriter for &mut T {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        (**self).write_frame(payload)
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        (**self).flush()
    }
}

impl<T: FrameWriter + ?Sized> FrameWriter for Box<T> {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        (**self).write_frame(payload)
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        (**self).flush()
    }
}

impl<T: FrameReader + ?Sized> FrameReader for &mut T {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        (**self).read_frame()
    }
}

impl<T: FrameReader + ?Sized> FrameReader for Box<T> {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        (**self).read_frame()
    }
}

/// Iterator over the frames of a [`FrameReader`]. Fused after the first
/// error or end-of-stream.
#[derive(Debug)]
pub struct Frames<'a, R> {
    reader: &'a mut R,
    done: bool,
}

impl<R: FrameReader> Iterator for Frames<'_, R> {
    type Item = Result<Bytes, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Settings of the newline-delimited reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewlineReaderConfig {
    /// Longest accepted line, terminator excluded.
    pub max_line_len: usize,
    /// Discard zero-length lines instead of yielding them.
    pub skip_empty: bool,
}

impl Default for NewlineReaderConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            skip_empty: false,
        }
    }
}

impl NewlineReaderConfig {
    pub fn skip_empty(skip_empty: bool) -> Self {
        Self { skip_empty, ..Self::default() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The underlying source or sink failed. `source` is passed through untouched.
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Input ended inside a frame (after its length prefix was started).
    #[error("truncated frame: declared {declared} payload bytes, input ended early")]
    Truncated { declared: u64 },

    /// Input ended in the middle of a length prefix.
    #[error("truncated frame: input ended inside the length prefix")]
    TruncatedPrefix,

    #[error("malformed length prefix: varint overflows 64 bits")]
    VarintOverflow,

    #[error("frame of {len} bytes exceeds the limit of {limit} bytes")]
    FrameTooLarge { len: u64, limit: usize },

    #[error("line too long: exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("frame writer lock poisoned")]
    Poisoned,
}

impl FrameError {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        FrameError::Io { op, source }
    }

    /// True for the truncation class of errors.
    pub fn is_truncation(&self) -> bool {
        matches!(self, FrameError::Truncated { .. } | FrameError::TruncatedPrefix)
    }

    /// Kind of the wrapped I/O error, if this is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            FrameError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
