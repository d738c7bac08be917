use std::io::{self, BufRead, BufReader, Read};

use bytes::Bytes;

use crate::constants::{MAX_VARINT_LEN64, NEWLINE, VARLEN_READER_BUFFER_SIZE};
use crate::stream::framing::types::{FrameError, FrameReader, NewlineReaderConfig};

fn read_byte<R: Read + ?Sized>(r: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Decode one unsigned LEB128 varint.
///
/// `Ok(None)` when the input ends before the first byte; `TruncatedPrefix`
/// when it ends after some of them.
pub fn read_uvarint<R: Read + ?Sized>(r: &mut R) -> Result<Option<u64>, FrameError> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for i in 0..MAX_VARINT_LEN64 {
        let byte = match read_byte(r).map_err(|e| FrameError::io("read length prefix", e))? {
            Some(b) => b,
            None if i == 0 => return Ok(None),
            None => return Err(FrameError::TruncatedPrefix),
        };

        if byte < 0x80 {
            // The 10th byte may only carry the single remaining bit.
            if i == MAX_VARINT_LEN64 - 1 && byte > 1 {
                return Err(FrameError::VarintOverflow);
            }
            return Ok(Some(value | (u64::from(byte) << shift)));
        }

        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }

    Err(FrameError::VarintOverflow)
}

/// Reads the format written by [`VarLenFrameWriter`](super::VarLenFrameWriter).
///
/// Payloads are staged in an owned scratch buffer whose capacity grows to the
/// largest payload seen and is never shrunk, so the cursor retains at most one
/// largest-frame worth of memory for its whole life. Returned frames are
/// copies the caller owns.
///
/// A prefix declaring more bytes than the stream holds costs only the bytes
/// actually present and fails with [`FrameError::Truncated`].
#[derive(Debug)]
pub struct VarLenFrameReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    max_frame_len: Option<usize>,
}

impl<R: Read> VarLenFrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: Vec::with_capacity(VARLEN_READER_BUFFER_SIZE),
            max_frame_len: None,
        }
    }

    /// Reject frames declaring more than `limit` bytes before allocating for them.
    pub fn with_max_frame_len(mut self, limit: usize) -> Self {
        self.max_frame_len = Some(limit);
        self
    }

    /// Capacity currently retained by the scratch buffer.
    pub fn retained_len(&self) -> usize {
        self.buf.capacity()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read> FrameReader for VarLenFrameReader<R> {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        let declared = match read_uvarint(&mut self.inner)? {
            Some(len) => len,
            None => return Ok(None),
        };

        let limit = self.max_frame_len.unwrap_or(usize::MAX);
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| *len <= limit)
            .ok_or(FrameError::FrameTooLarge { len: declared, limit })?;

        // grow with the bytes that arrive, never with the declared length
        self.buf.clear();
        let read = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut self.buf)
            .map_err(|e| FrameError::io("read payload", e))?;

        if read < len {
            return Err(FrameError::Truncated { declared });
        }
        Ok(Some(Bytes::copy_from_slice(&self.buf)))
    }
}

/// Splits a stream on `\n`.
///
/// Not the exact inverse of [`NewlineDelimitedFrameWriter`](super::NewlineDelimitedFrameWriter):
/// - a `\r` right before the terminator is dropped, so `\r\n` text reads back
///   without it;
/// - with `skip_empty`, zero-length lines are never yielded;
/// - lines longer than `max_line_len` fail with [`FrameError::LineTooLong`].
///
/// A final line without terminator is yielded; an empty remainder is not.
#[derive(Debug)]
pub struct NewlineDelimitedFrameReader<R> {
    inner: BufReader<R>,
    config: NewlineReaderConfig,
}

impl<R: Read> NewlineDelimitedFrameReader<R> {
    pub fn new(inner: R, skip_empty: bool) -> Self {
        Self::with_config(inner, NewlineReaderConfig::skip_empty(skip_empty))
    }

    pub fn with_config(inner: R, config: NewlineReaderConfig) -> Self {
        Self {
            inner: BufReader::new(inner),
            config,
        }
    }

    pub fn config(&self) -> &NewlineReaderConfig {
        &self.config
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let limit = self.config.max_line_len;
        let mut line = Vec::new();
        let mut saw_input = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::io("read line", e)),
            };
            if available.is_empty() {
                break;
            }
            saw_input = true;

            let (used, terminated) = match available.iter().position(|b| *b == NEWLINE) {
                Some(pos) => {
                    line.extend_from_slice(&available[..pos]);
                    (pos + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            };
            self.inner.consume(used);

            if terminated {
                break;
            }
            // one byte of slack for a '\r' waiting for its '\n'
            if line.len() > limit.saturating_add(1) {
                return Err(FrameError::LineTooLong { limit });
            }
        }

        if !saw_input {
            return Ok(None);
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > limit {
            return Err(FrameError::LineTooLong { limit });
        }

        Ok(Some(line))
    }
}

impl<R: Read> FrameReader for NewlineDelimitedFrameReader<R> {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.is_empty() && self.config.skip_empty => continue,
                Some(line) => return Ok(Some(Bytes::from(line))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uvarint_eof_before_first_byte_is_end_of_stream() {
        let mut empty: &[u8] = &[];
        assert_eq!(read_uvarint(&mut empty).unwrap(), None);
    }

    #[test]
    fn uvarint_eof_inside_prefix_is_truncation() {
        let mut partial: &[u8] = &[0x80, 0x80];
        assert!(matches!(read_uvarint(&mut partial), Err(FrameError::TruncatedPrefix)));
    }

    #[test]
    fn uvarint_rejects_overlong_encodings() {
        let mut eleven: &[u8] = &[0xff; 11];
        assert!(matches!(read_uvarint(&mut eleven), Err(FrameError::VarintOverflow)));

        let mut tenth_too_big: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        assert!(matches!(read_uvarint(&mut tenth_too_big), Err(FrameError::VarintOverflow)));

        let mut max: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert_eq!(read_uvarint(&mut max).unwrap(), Some(u64::MAX));
    }

    #[test]
    fn crlf_and_trailing_remainder() {
        let mut r = NewlineDelimitedFrameReader::new(&b"a\r\nb\n\nc\r"[..], false);
        let frames: Vec<Bytes> = r.frames().collect::<Result<_, _>>().unwrap();
        let expected: Vec<Bytes> = [&b"a"[..], b"b", b"", b"c"]
            .into_iter()
            .map(Bytes::copy_from_slice)
            .collect();
        assert_eq!(frames, expected);
    }

    #[test]
    fn lone_carriage_return_inside_a_line_is_kept() {
        let mut r = NewlineDelimitedFrameReader::new(&b"a\rb\n"[..], false);
        assert_eq!(r.read_frame().unwrap().as_deref(), Some(&b"a\rb"[..]));
        assert_eq!(r.read_frame().unwrap(), None);
    }
}
