//! Counters collected while decoding chunks.
//!
//! Each worker owns its counters; the collector merges them once per chunk,
//! so no atomics or locks are involved.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeCounters {
    pub chunks: u64,
    pub frames: u64,
    /// Raw chunk bytes, delimiters included.
    pub bytes_raw: u64,
    /// Payload bytes of the decoded frames.
    pub bytes_payload: u64,
}

impl DecodeCounters {
    /// Record one decoded chunk.
    pub fn add_chunk(&mut self, raw_len: usize, frames: &[impl AsRef<[u8]>]) {
        self.chunks += 1;
        self.bytes_raw += raw_len as u64;
        self.frames += frames.len() as u64;
        self.bytes_payload += frames.iter().map(|f| f.as_ref().len() as u64).sum::<u64>();
    }

    /// Bytes spent on delimiters and skipped empty lines.
    pub fn framing_overhead_bytes(&self) -> u64 {
        self.bytes_raw.saturating_sub(self.bytes_payload)
    }

    pub fn merge(&mut self, other: &DecodeCounters) {
        self.chunks += other.chunks;
        self.frames += other.frames;
        self.bytes_raw += other.bytes_raw;
        self.bytes_payload += other.bytes_payload;
    }
}

impl AddAssign for DecodeCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
