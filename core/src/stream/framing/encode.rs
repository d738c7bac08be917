use std::io::Write;
use std::sync::Mutex;

use crate::constants::{MAX_VARINT_LEN64, NEWLINE};
use crate::stream::framing::types::{FrameError, FrameWriter};

/// Encode `value` as an unsigned LEB128 varint into `buf`, returning the
/// number of bytes used.
///
/// Layout: 7 value bits per byte, least significant group first, high bit set
/// on every byte except the last.
#[inline]
pub fn encode_uvarint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN64]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Frames each message as its length (uvarint) followed by the message.
///
/// ```text
/// [ uvarint payload length (1..=10) ]
/// [ payload (N)                     ]
/// ```
#[derive(Debug)]
pub struct VarLenFrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> VarLenFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameWriter for VarLenFrameWriter<W> {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        let mut prefix = [0u8; MAX_VARINT_LEN64];
        let prefix_len = encode_uvarint(payload.len() as u64, &mut prefix);

        self.inner
            .write_all(&prefix[..prefix_len])
            .map_err(|e| FrameError::io("write length prefix", e))?;
        self.inner
            .write_all(payload)
            .map_err(|e| FrameError::io("write payload", e))?;

        Ok(prefix_len + payload.len())
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.flush().map_err(|e| FrameError::io("flush", e))
    }
}

/// Separates messages with a single `\n`: the first payload is written as is,
/// every later one is preceded by the separator. No trailing separator is
/// emitted.
///
/// Payloads must not contain `\n`. This is not checked; a payload carrying the
/// separator reads back as several frames. The format exists for
/// newline-delimited JSON and similar line-oriented data.
#[derive(Debug)]
pub struct NewlineDelimitedFrameWriter<W: Write> {
    inner: W,
    first: bool,
}

impl<W: Write> NewlineDelimitedFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, first: true }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> FrameWriter for NewlineDelimitedFrameWriter<W> {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        let mut written = 0;
        if self.first {
            self.first = false;
        } else {
            self.inner
                .write_all(&[NEWLINE])
                .map_err(|e| FrameError::io("write separator", e))?;
            written += 1;
        }

        self.inner
            .write_all(payload)
            .map_err(|e| FrameError::io("write payload", e))?;

        Ok(written + payload.len())
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.flush().map_err(|e| FrameError::io("flush", e))
    }
}

/// Serializes writers of a shared [`FrameWriter`] behind a mutex, one lock
/// acquisition per frame. Frames from different producers never interleave
/// at the byte level; their relative order is unspecified.
#[derive(Debug)]
pub struct ConcurrentFrameWriter<W> {
    inner: Mutex<W>,
}

impl<W: FrameWriter> ConcurrentFrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: Mutex::new(inner) }
    }

    /// Write one frame from any thread holding a shared reference.
    pub fn write_frame(&self, payload: &[u8]) -> Result<usize, FrameError> {
        let mut guard = self.inner.lock().map_err(|_| FrameError::Poisoned)?;
        guard.write_frame(payload)
    }

    pub fn flush(&self) -> Result<(), FrameError> {
        let mut guard = self.inner.lock().map_err(|_| FrameError::Poisoned)?;
        guard.flush()
    }

    pub fn into_inner(self) -> Result<W, FrameError> {
        self.inner.into_inner().map_err(|_| FrameError::Poisoned)
    }
}

impl<W: FrameWriter> FrameWriter for ConcurrentFrameWriter<W> {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        self.inner
            .get_mut()
            .map_err(|_| FrameError::Poisoned)?
            .write_frame(payload)
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.get_mut().map_err(|_| FrameError::Poisoned)?.flush()
    }
}

impl<W: FrameWriter> FrameWriter for &ConcurrentFrameWriter<W> {
    fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        ConcurrentFrameWriter::write_frame(self, payload)
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        ConcurrentFrameWriter::flush(self)
    }
}
