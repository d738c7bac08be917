use std::io::{self, Read};

use bytes::Bytes;

/// Read until `len` bytes are collected or the source reports end-of-input.
///
/// Short reads from the source are retried, so a result shorter than `len`
/// always means the source is exhausted. Interrupted reads are retried too.
pub fn read_exact_or_eof<R: Read + ?Sized>(r: &mut R, len: usize) -> io::Result<Bytes> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

/// Concatenate frames with a single delimiter between each pair.
pub fn join_frames(frames: &[impl AsRef<[u8]>], delimiter: u8) -> Vec<u8> {
    let total = frames.iter().map(|f| f.as_ref().len() + 1).sum::<usize>();
    let mut out = Vec::with_capacity(total);
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.extend_from_slice(frame.as_ref());
    }
    out
}
