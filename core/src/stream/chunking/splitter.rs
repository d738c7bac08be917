use std::io::Read;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::constants::NEWLINE;
use crate::stream::chunking::types::{Chunk, ChunkError, ChunkReader, ChunkerConfig};
use crate::utils::read_exact_or_eof;

/// Splits a newline-delimited stream into chunks ending on a delimiter.
///
/// Each call reads up to `chunk_size` raw bytes. Everything up to and
/// including the last `\n` of that window, prefixed by the carry left by the
/// previous call, becomes the chunk; the bytes after it are carried over.
///
/// - A full window without any `\n` is accepted only when the byte after it is
///   a `\n` or the end of input; otherwise it fails with
///   [`ChunkError::NoFrameBoundary`].
/// - A short window marks the source exhausted; a non-empty carry is then
///   delivered as one last chunk on the following call.
///
/// The chunker does not strip `\r`; the per-chunk cursors do.
///
/// Strictly sequential: boundary discovery mutates the carry, hence `&mut self`.
/// The chunker is fused after end-of-stream and after any error.
#[derive(Debug)]
pub struct DelimitedChunker<R> {
    /// `None` once the source reported end-of-input.
    reader: Option<R>,
    config: ChunkerConfig,
    carry: Bytes,
    next_index: u64,
}

impl<R: Read> DelimitedChunker<R> {
    pub fn new(reader: R, chunk_size: usize) -> Result<Self, ChunkError> {
        Self::with_config(reader, ChunkerConfig::with_chunk_size(chunk_size))
    }

    pub fn with_config(reader: R, config: ChunkerConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self {
            reader: Some(reader),
            config,
            carry: Bytes::new(),
            next_index: 0,
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Bytes currently held back for the next chunk.
    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }

    fn emit(&mut self, content: Bytes) -> Chunk {
        let chunk = Chunk::new(self.next_index, content, self.config.max_line_len);
        trace!(
            index = chunk.index(),
            len = chunk.len(),
            carry = self.carry.len(),
            "chunk boundary"
        );
        self.next_index += 1;
        chunk
    }

    /// One byte beyond a full window, `None` at end-of-input.
    fn read_past_window(&mut self) -> Result<Option<u8>, ChunkError> {
        let read = match self.reader.as_mut() {
            Some(reader) => read_exact_or_eof(reader, 1),
            None => return Ok(None),
        };
        match read {
            Ok(byte) => Ok(byte.first().copied()),
            Err(source) => {
                self.abort();
                Err(ChunkError::Io { op: "read chunk", source })
            }
        }
    }

    fn abort(&mut self) {
        self.reader = None;
        self.carry = Bytes::new();
    }
}

fn concat(head: Bytes, tail: Bytes) -> Bytes {
    if head.is_empty() {
        return tail;
    }
    let mut joined = BytesMut::with_capacity(head.len() + tail.len());
    joined.extend_from_slice(&head);
    joined.extend_from_slice(&tail);
    joined.freeze()
}

impl<R: Read> ChunkReader for DelimitedChunker<R> {
    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        if self.reader.is_none() {
            if self.carry.is_empty() {
                return Ok(None);
            }
            let residual = std::mem::take(&mut self.carry);
            return Ok(Some(self.emit(residual)));
        }

        let chunk_size = self.config.chunk_size;
        let read = match self.reader.as_mut() {
            Some(reader) => read_exact_or_eof(reader, chunk_size),
            None => return Ok(None),
        };
        let window = match read {
            Ok(window) => window,
            Err(source) => {
                self.abort();
                return Err(ChunkError::Io { op: "read chunk", source });
            }
        };

        let short = window.len() < chunk_size;
        if short {
            debug!(chunks = self.next_index, "chunk source exhausted");
            self.reader = None;
        }

        let content = match window.iter().rposition(|b| *b == NEWLINE) {
            Some(pos) => {
                let head = std::mem::replace(&mut self.carry, window.slice(pos + 1..));
                concat(head, window.slice(..=pos))
            }
            None if short => concat(std::mem::take(&mut self.carry), window),
            // Full window without a delimiter: the frame fits exactly only if
            // the next byte ends it.
            None => match self.read_past_window()? {
                None => {
                    debug!(chunks = self.next_index, "chunk source exhausted");
                    self.reader = None;
                    concat(std::mem::take(&mut self.carry), window)
                }
                Some(NEWLINE) => {
                    let head = std::mem::take(&mut self.carry);
                    let mut joined = BytesMut::with_capacity(head.len() + window.len() + 1);
                    joined.extend_from_slice(&head);
                    joined.extend_from_slice(&window);
                    joined.extend_from_slice(&[NEWLINE]);
                    joined.freeze()
                }
                Some(_) => {
                    self.abort();
                    return Err(ChunkError::NoFrameBoundary { chunk_size });
                }
            },
        };

        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.emit(content)))
    }
}

impl<R: Read> Iterator for DelimitedChunker<R> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Drain a chunker. Any error is returned with no partial result.
///
/// Holds the whole source in memory and never returns on an infinite source;
/// meant for tests and small inputs.
pub fn read_all_chunks<C: ChunkReader + ?Sized>(chunker: &mut C) -> Result<Vec<Chunk>, ChunkError> {
    let mut chunks = Vec::new();
    while let Some(chunk) = chunker.next_chunk()? {
        chunks.push(chunk);
    }
    Ok(chunks)
}
