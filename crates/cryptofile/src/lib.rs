//! Encrypted and compressed capture container.
//!
//! Session captures are stored as a sequence of independently decodable
//! chunks: each run of up to [`CLEAR_CHUNK_SIZE`] plaintext bytes is Snappy
//! compressed, then AES-256-CBC encrypted with a per-file key derived from
//! the master key and the file name. A fixed header carries the random IV
//! material and a fixed trailer records the total plaintext length. Two
//! HMAC-SHA256 digests are maintained over the bytes actually written to
//! storage: a quick one over the first [`QUICK_HASH_SIZE`] bytes and a full
//! one over the entire file, so that large captures can be spot checked
//! without a full read.

mod context;
mod decrypt;
mod encrypt;
mod error;
mod random;

pub use context::CryptoContext;
pub use decrypt::{Decrypter, EncryptionMode};
pub use encrypt::{Encrypter, Hashes};
pub use error::Error;
pub use random::{LcgRandom, OsRandom, RandomSource};

/// First four bytes of an encrypted container, "WCFM" on the wire.
pub const MAGIC: u32 = 0x4D46_4357;

/// Chunk length sentinel announcing the trailer, "MFCW" on the wire.
pub const EOF_MAGIC: u32 = 0x5743_464D;

/// Only container version ever produced.
pub const VERSION: u32 = 1;

/// Plaintext bytes buffered before a chunk is compressed and encrypted.
pub const CLEAR_CHUNK_SIZE: usize = 16384;

/// Stored-byte window covered by the quick hash.
pub const QUICK_HASH_SIZE: usize = 4096;

/// Random IV material carried by the header. The cipher only consumes the
/// first [`CIPHER_IV_SIZE`] bytes of it.
pub const HEADER_IV_SIZE: usize = 32;

/// AES-CBC initialization vector length.
pub const CIPHER_IV_SIZE: usize = 16;

/// Master key, HMAC key and derived cipher key length.
pub const KEY_SIZE: usize = 32;

/// Largest ciphered chunk a well formed container may carry: worst case
/// Snappy expansion of a full clear chunk plus one block of padding.
pub fn max_ciphered_size() -> usize {
    snap::raw::max_compress_len(CLEAR_CHUNK_SIZE) + 16
}
