// Boundary-aligned chunking:

// * chunk frames == whole-stream frames (newline reader, empty lines skipped)
// * boundary placement and the residual carry
// * boundary and configuration errors

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use bytes::Bytes;
    use proptest::prelude::*;
    use streamframe_core::stream::chunking::{
        read_all_chunks, Chunk, ChunkError, ChunkReader, ChunkerConfig, DelimitedChunker,
    };
    use streamframe_core::stream::framing::{FrameError, NewlineDelimitedFrameReader};
    use streamframe_core::stream::{read_all_frames, MultiFrameReader};
    use streamframe_core::utils::join_frames;

    const CHUNK_SIZE: usize = 128;

    fn stream_frames(input: &[u8]) -> Vec<Bytes> {
        read_all_frames(&mut NewlineDelimitedFrameReader::new(input, true)).unwrap()
    }

    fn chunks_of(input: &[u8], chunk_size: usize) -> Vec<Chunk> {
        let mut chunker = DelimitedChunker::new(input, chunk_size).unwrap();
        read_all_chunks(&mut chunker).unwrap()
    }

    fn chunked_frames(input: &[u8], chunk_size: usize) -> Vec<Bytes> {
        let readers = chunks_of(input, chunk_size)
            .into_iter()
            .map(Chunk::into_frame_reader);
        read_all_frames(&mut MultiFrameReader::new(readers)).unwrap()
    }

    fn assert_chunked_roundtrip(input: &[u8], chunk_size: usize) {
        assert_eq!(stream_frames(input), chunked_frames(input, chunk_size));
    }

    fn raw(chunks: &[Chunk]) -> Vec<&[u8]> {
        chunks.iter().map(|c| &c.bytes()[..]).collect()
    }

// # ✅ 1. Chunked decode equals whole-stream decode

    #[test]
    fn empty_input() {
        assert!(chunks_of(b"", CHUNK_SIZE).is_empty());
        assert_chunked_roundtrip(b"", CHUNK_SIZE);
    }

    #[test]
    fn single_unterminated_frame() {
        let chunks = chunks_of(b"c:bob", CHUNK_SIZE);
        assert_eq!(raw(&chunks), vec![&b"c:bob"[..]]);
        assert_chunked_roundtrip(b"c:bob", CHUNK_SIZE);
    }

    #[test]
    fn single_terminated_frame() {
        let chunks = chunks_of(b"c:bob\n", CHUNK_SIZE);
        assert_eq!(raw(&chunks), vec![&b"c:bob\n"[..]]);
        assert_chunked_roundtrip(b"c:bob\n", CHUNK_SIZE);
    }

    #[test]
    fn hashed_entries_across_chunks() {
        let lines = "
e:538c7f96b164bf1b97bb9f4bb472e89f5b1484f25209c9d9343e92ba09dd9d52
e:dfd79b4d76429b617a0c9f9f0d3ba55b0cc0d6144c888535841acbe0709b0758
e:083f61d375bc02b41df4f91929e18fda9e6f82e54e748e81e79e4bbd6fe34cdc
e:ba843ee8d63e8c4ffe1cebea546d8fac13dd1aac04ce2ea2877c5579cfa2c78e
e:1b0bafae881b82a751108a42ed3c903caa43465a78620616978aed0ce3c6c4f3
e:ae7bc3e0495b5712fefdbe0c102887e100dacd2d885f692cb607da00a11c1c70
e:71e796a2dc2dc25a5b74b2e129705e273f05c92326828e2b056e3817658e1061
e:498947fdf344410ed4c116023fa8e3576b6fed27ff8974bac0cafd9ad05692b1
e:3619e738964dfdc79e8d534373661cfd66d74fec1e1b89491ab7236e4b752162
e:90cf2beb42c3ca27328560f1aac067cea6e8bf46d4ab2b4680402c5fb2820e88
";
        let chunks = chunks_of(lines.as_bytes(), CHUNK_SIZE);
        assert!(chunks.len() > 1);
        assert_eq!(stream_frames(lines.as_bytes()).len(), 10);
        assert_chunked_roundtrip(lines.as_bytes(), CHUNK_SIZE);
    }

// # ✅ 2. Boundary placement

    #[test]
    fn chunks_end_on_last_delimiter_of_each_window() {
        let chunks = chunks_of(b"ab\ncd\nef\n", 4);
        assert_eq!(raw(&chunks), vec![&b"ab\n"[..], b"cd\n", b"ef\n"]);
        let indexes: Vec<u64> = chunks.iter().map(Chunk::index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn several_delimiters_in_one_window_stay_together() {
        let chunks = chunks_of(b"a\nb\nc\nlonger\n", 8);
        assert_eq!(raw(&chunks)[0], &b"a\nb\nc\n"[..]);
        assert_chunked_roundtrip(b"a\nb\nc\nlonger\n", 8);
    }

    #[test]
    fn window_ending_exactly_on_delimiter() {
        let chunks = chunks_of(b"ab\n", 3);
        assert_eq!(raw(&chunks), vec![&b"ab\n"[..]]);
    }

    #[test]
    fn final_frame_filling_the_whole_window() {
        let chunks = chunks_of(b"abc\ndefg", 4);
        assert_eq!(raw(&chunks), vec![&b"abc\n"[..], b"defg"]);
        assert_chunked_roundtrip(b"abc\ndefg", 4);
    }

    #[test]
    fn frame_filling_the_window_takes_the_next_delimiter() {
        let chunks = chunks_of(b"abcd\nef", 4);
        assert_eq!(raw(&chunks), vec![&b"abcd\n"[..], b"ef"]);
        assert_chunked_roundtrip(b"abcd\nef", 4);
        assert_chunked_roundtrip(b"abcd\nefgh\n", 4);
    }

    #[test]
    fn residual_carry_is_emitted_as_final_chunk() {
        let mut chunker = DelimitedChunker::new(&b"a\nb"[..], CHUNK_SIZE).unwrap();

        let first = chunker.next_chunk().unwrap().unwrap();
        assert_eq!(&first.bytes()[..], b"a\n");
        assert_eq!(chunker.carry_len(), 1);

        let last = chunker.next_chunk().unwrap().unwrap();
        assert_eq!(&last.bytes()[..], b"b");
        assert_eq!(last.index(), 1);

        assert!(chunker.next_chunk().unwrap().is_none());
        assert!(chunker.next_chunk().unwrap().is_none());
        assert_chunked_roundtrip(b"a\nb", CHUNK_SIZE);
    }

    #[test]
    fn chunk_size_larger_than_input() {
        let chunks = chunks_of(b"x\ny\nz\n", 1 << 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].decode().unwrap(), vec![
            Bytes::from_static(b"x"),
            Bytes::from_static(b"y"),
            Bytes::from_static(b"z"),
        ]);
    }

    #[test]
    fn chunks_preserve_carriage_returns_for_the_cursor_to_strip() {
        let chunks = chunks_of(b"a\r\nb\r\n", 4);
        assert_eq!(raw(&chunks), vec![&b"a\r\n"[..], b"b\r\n"]);
        assert_chunked_roundtrip(b"a\r\nb\r\n", 4);
    }

    #[test]
    fn chunker_iterates() {
        let chunker = DelimitedChunker::new(&b"1\n2\n3\n"[..], 2).unwrap();
        let chunks: Vec<Chunk> = chunker.collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 3);
    }

// # ✅ 3. Errors

    #[test]
    fn frame_longer_than_chunk_has_no_boundary() {
        let mut chunker = DelimitedChunker::new(&b"abcdefgh\n"[..], 4).unwrap();
        assert!(matches!(
            chunker.next_chunk(),
            Err(ChunkError::NoFrameBoundary { chunk_size: 4 })
        ));
        // fused
        assert!(chunker.next_chunk().unwrap().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(matches!(
            DelimitedChunker::new(&b""[..], 0),
            Err(ChunkError::InvalidChunkSize(0))
        ));

        let config = ChunkerConfig { chunk_size: 16, max_line_len: 0 };
        assert!(matches!(
            DelimitedChunker::with_config(&b""[..], config),
            Err(ChunkError::InvalidMaxLineLen(0))
        ));
    }

    #[test]
    fn chunk_cursor_honors_line_limit() {
        let config = ChunkerConfig { chunk_size: 64, max_line_len: 4 };
        let mut chunker = DelimitedChunker::with_config(&b"ok\ntoolong\n"[..], config).unwrap();
        let chunk = chunker.next_chunk().unwrap().unwrap();
        assert!(matches!(chunk.decode(), Err(FrameError::LineTooLong { limit: 4 })));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn source_errors_surface_and_fuse() {
        let mut chunker = DelimitedChunker::new(FailingReader, 16).unwrap();
        match chunker.next_chunk() {
            Err(ChunkError::Io { source, .. }) => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected Io, got {:?}", other),
        }
        assert!(chunker.next_chunk().unwrap().is_none());
    }

// # ✅ 4. Property: chunking never changes the frames

    proptest! {
        #[test]
        fn chunked_equals_streamed(
            lines in proptest::collection::vec("[a-z]{0,20}", 0..40),
            trailing in any::<bool>(),
            chunk_size in 20usize..96,
        ) {
            let mut input = join_frames(&lines, b'\n');
            if trailing {
                input.push(b'\n');
            }
            prop_assert_eq!(stream_frames(&input), chunked_frames(&input, chunk_size));
        }
    }
}
