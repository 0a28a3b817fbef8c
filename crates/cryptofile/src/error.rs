/// Container read or write failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad container magic: {found:#010x}")]
    BadMagic { found: u32 },
    #[error("unsupported container version: {version}")]
    UnsupportedVersion { version: u32 },
    #[error("ciphered chunk of {len} bytes exceeds the {max} byte limit")]
    ChunkTooLarge { len: usize, max: usize },
    #[error("chunk decryption failed")]
    BadPadding,
    #[error("chunk decompression failed: {0}")]
    Compression(#[from] snap::Error),
    #[error("container ends in the middle of a chunk")]
    Truncated,
}
