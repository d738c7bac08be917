//! Composition of decode cursors.

use bytes::Bytes;

use crate::stream::framing::{FrameError, FrameReader, FrameWriter};

/// Concatenates several cursors into one, like `Read::chain` over many readers.
///
/// Cursors are consumed in order; each one is dropped as soon as it reports
/// end-of-stream rather than kept until the composite goes away.
#[derive(Debug)]
pub struct MultiFrameReader<R> {
    readers: Vec<Option<R>>,
    current: usize,
}

impl<R: FrameReader> MultiFrameReader<R> {
    pub fn new<I>(readers: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        Self {
            readers: readers.into_iter().map(Some).collect(),
            current: 0,
        }
    }

    /// Cursors not yet exhausted.
    pub fn remaining(&self) -> usize {
        self.readers.len() - self.current
    }
}

impl<R: FrameReader> FrameReader for MultiFrameReader<R> {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        while let Some(slot) = self.readers.get_mut(self.current) {
            if let Some(reader) = slot.as_mut() {
                if let Some(frame) = reader.read_frame()? {
                    return Ok(Some(frame));
                }
            }
            // exhausted: release it and move on
            slot.take();
            self.current += 1;
        }
        Ok(None)
    }
}

/// Cursor over frames that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct SliceFrameReader {
    frames: Vec<Bytes>,
    pos: usize,
}

impl SliceFrameReader {
    pub fn new<I, F>(frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Bytes>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
            pos: 0,
        }
    }
}

impl FrameReader for SliceFrameReader {
    fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        let frame = self.frames.get(self.pos).cloned();
        if frame.is_some() {
            self.pos += 1;
        }
        Ok(frame)
    }
}

/// Read every frame until end-of-stream.
///
/// Any other error is returned with no partial result.
pub fn read_all_frames<R: FrameReader + ?Sized>(reader: &mut R) -> Result<Vec<Bytes>, FrameError> {
    let mut frames = Vec::with_capacity(16);
    while let Some(frame) = reader.read_frame()? {
        frames.push(frame);
    }
    Ok(frames)
}

/// Write every payload in order, returning the encoded length of all of them.
pub fn write_all_frames<W, I, P>(writer: &mut W, payloads: I) -> Result<usize, FrameError>
where
    W: FrameWriter + ?Sized,
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut total = 0;
    for payload in payloads {
        total += writer.write_frame(payload.as_ref())?;
    }
    Ok(total)
}
