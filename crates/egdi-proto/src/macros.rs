macro_rules! ensure_size {
    ($buf:ident [ $expected:expr ] for $name:expr) => {{
        let received = ::bytes::Buf::remaining(&$buf);
        let expected = $expected;
        if received < expected {
            return Err($crate::Error::NotEnoughBytes {
                name: $name,
                received,
                expected,
            });
        }
    }};
}
