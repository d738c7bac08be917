#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;
    use streamframe_core::stream::framing::{
        FrameError, FrameReader, FrameWriter, NewlineDelimitedFrameReader, VarLenFrameReader,
        VarLenFrameWriter,
    };
    use streamframe_core::stream::{read_all_frames, write_all_frames, MultiFrameReader, SliceFrameReader};

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn multi_reader_concatenates_in_order() {
        let mut r = MultiFrameReader::new(vec![
            SliceFrameReader::new(["a", "b"]),
            SliceFrameReader::new(Vec::<Bytes>::new()),
            SliceFrameReader::new(["c"]),
        ]);
        assert_eq!(read_all_frames(&mut r).unwrap(), vec![b("a"), b("b"), b("c")]);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.read_frame().unwrap(), None);
    }

    #[test]
    fn multi_reader_with_no_readers_is_empty() {
        let mut r = MultiFrameReader::new(Vec::<SliceFrameReader>::new());
        assert_eq!(r.read_frame().unwrap(), None);
    }

    #[test]
    fn multi_reader_releases_exhausted_readers() {
        let mut r = MultiFrameReader::new(vec![
            SliceFrameReader::new(["a"]),
            SliceFrameReader::new(["b"]),
        ]);
        assert_eq!(r.remaining(), 2);
        r.read_frame().unwrap();
        assert_eq!(r.remaining(), 2);
        // exhausting the first cursor moves on to the second
        r.read_frame().unwrap();
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn multi_reader_stops_at_first_error() {
        let readers: Vec<Box<dyn FrameReader>> = vec![
            Box::new(SliceFrameReader::new(["ok"])),
            Box::new(VarLenFrameReader::new(&b"\x09short"[..])),
            Box::new(SliceFrameReader::new(["never"])),
        ];
        let mut r = MultiFrameReader::new(readers);
        assert_eq!(r.read_frame().unwrap(), Some(b("ok")));
        assert!(matches!(r.read_frame(), Err(FrameError::Truncated { declared: 9 })));
    }

    #[test]
    fn multi_reader_over_mixed_formats() {
        let mut w = VarLenFrameWriter::new(Vec::new());
        write_all_frames(&mut w, ["v1", "v2"]).unwrap();

        let readers: Vec<Box<dyn FrameReader>> = vec![
            Box::new(VarLenFrameReader::new(Cursor::new(w.into_inner()))),
            Box::new(NewlineDelimitedFrameReader::new(&b"n1\nn2\n"[..], false)),
        ];
        let frames = read_all_frames(&mut MultiFrameReader::new(readers)).unwrap();
        assert_eq!(frames, vec![b("v1"), b("v2"), b("n1"), b("n2")]);
    }

    #[test]
    fn slice_reader_yields_then_ends() {
        let mut r = SliceFrameReader::new([b"x".to_vec(), Vec::new()]);
        assert_eq!(r.read_frame().unwrap(), Some(b("x")));
        assert_eq!(r.read_frame().unwrap(), Some(Bytes::new()));
        assert_eq!(r.read_frame().unwrap(), None);
        assert_eq!(r.read_frame().unwrap(), None);
    }

    #[test]
    fn read_all_frames_via_trait_object() {
        let mut r: Box<dyn FrameReader> = Box::new(SliceFrameReader::new(["1", "2"]));
        assert_eq!(read_all_frames(r.as_mut()).unwrap().len(), 2);
    }

    #[test]
    fn write_all_frames_sums_wire_lengths() {
        let mut w = VarLenFrameWriter::new(Vec::new());
        let n = write_all_frames(&mut w, [b"abc".as_slice(), b""]).unwrap();
        w.flush().unwrap();
        assert_eq!(n, 5);
        assert_eq!(w.get_ref().len(), 5);
    }
}
