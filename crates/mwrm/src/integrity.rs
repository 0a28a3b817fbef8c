use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::MetaLine;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the stored bytes of a file, up to `limit` bytes when
/// one is given.
pub fn file_hmac(path: &Path, key: &[u8], limit: Option<u64>) -> io::Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");

    let mut buf = [0u8; 4096];
    let mut hashed: u64 = 0;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let take = match limit {
            Some(limit) => usize::try_from((limit - hashed).min(n as u64)).unwrap_or(n),
            None => n,
        };
        mac.update(&buf[..take]);
        hashed += take as u64;
        if limit.is_some_and(|limit| hashed >= limit) {
            break;
        }
    }

    Ok(mac.finalize().into_bytes().into())
}

/// Digest over the quick-check window, to compare against `hash1`.
pub fn quick_hmac(path: &Path, key: &[u8]) -> io::Result<[u8; 32]> {
    file_hmac(path, key, Some(cryptofile::QUICK_HASH_SIZE as u64))
}

/// Digest over the whole file, to compare against `hash2`.
pub fn full_hmac(path: &Path, key: &[u8]) -> io::Result<[u8; 32]> {
    file_hmac(path, key, None)
}

/// Checks one manifest entry against the part file it references,
/// resolved relative to `dir`.
///
/// With digests available, the quick or full digest is recomputed and
/// compared. Without digests the recorded size is checked instead, and an
/// entry carrying neither is accepted as is.
pub fn verify_line(dir: &Path, line: &MetaLine, key: &[u8], quick: bool) -> io::Result<bool> {
    let path = dir.join(&line.filename);

    if let Some(hashes) = &line.hashes {
        let (expected, actual) = if quick {
            (hashes.hash1, quick_hmac(&path, key)?)
        } else {
            (hashes.hash2, full_hmac(&path, key)?)
        };
        return Ok(actual == expected);
    }

    if let Some(stat) = &line.stat {
        let len = std::fs::metadata(&path)?.len();
        return Ok(i64::try_from(len).is_ok_and(|len| len == stat.size));
    }

    Ok(true)
}
