/// Manifest read or write failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest ends inside the header")]
    TruncatedHeader,
    #[error("malformed manifest line {line}: {reason}")]
    MalformedLine { line: u64, reason: &'static str },
    #[error("manifest line is missing its digests")]
    MissingHashes,
}
