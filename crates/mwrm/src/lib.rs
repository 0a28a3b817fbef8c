//! Reader and writer for `.mwrm` capture manifests.
//!
//! A manifest lists the capture part files of one recorded session, one
//! line per part, with the recording time span and integrity digests of
//! each part. Two header layouts exist: the legacy v1 layout where every
//! line is `filename start stop hash1 hash2`, and the v2 layout which adds
//! a block of stat fields after the filename and only carries the digests
//! when the header announces checksums. Filenames may contain spaces, so
//! lines are split from the right.

mod error;
mod integrity;
mod reader;
mod writer;

pub use error::Error;
pub use integrity::{file_hmac, full_hmac, quick_hmac, verify_line};
pub use reader::MwrmReader;
pub use writer::{write_header, write_line};

/// Manifest layout generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MwrmVersion {
    V1,
    V2,
}

/// Parsed manifest header.
///
/// `has_checksum` is only meaningful for v2 manifests: v1 lines always
/// carry their digests, unannounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaHeader {
    pub version: MwrmVersion,
    pub has_checksum: bool,
}

/// Stat block recorded per part file by v2 manifests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub size: i64,
    pub mode: i64,
    pub uid: i64,
    pub gid: i64,
    pub dev: i64,
    pub ino: i64,
    pub mtime: i64,
    pub ctime: i64,
}

/// Integrity digests of one part file, over its stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHashes {
    /// HMAC-SHA256 over the first 4096 stored bytes.
    pub hash1: [u8; 32],
    /// HMAC-SHA256 over the whole stored file.
    pub hash2: [u8; 32],
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaLine {
    pub filename: String,
    /// Present in v2 manifests only.
    pub stat: Option<Stat>,
    pub start_time: i64,
    pub stop_time: i64,
    /// Always present for v1, gated on the header for v2.
    pub hashes: Option<LineHashes>,
}
