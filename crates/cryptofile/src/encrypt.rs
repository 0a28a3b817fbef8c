use std::io::Write;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::context::CryptoContext;
use crate::random::RandomSource;
use crate::{
    max_ciphered_size, Error, CIPHER_IV_SIZE, CLEAR_CHUNK_SIZE, EOF_MAGIC, HEADER_IV_SIZE, KEY_SIZE,
    MAGIC, QUICK_HASH_SIZE, VERSION,
};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Integrity digests of one finished container, over the stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hashes {
    /// HMAC-SHA256 over the first [`QUICK_HASH_SIZE`] stored bytes.
    pub quick: [u8; 32],
    /// HMAC-SHA256 over the whole stored file.
    pub full: [u8; 32],
}

/// Streaming container writer.
///
/// Plaintext accumulates in an internal buffer and leaves as one chunk per
/// [`CLEAR_CHUNK_SIZE`] bytes. Each chunk is compressed and encrypted on
/// its own with the cipher state reset to the header IV, so a damaged
/// chunk does not cascade into its successors.
pub struct Encrypter<W: Write> {
    inner: W,
    encrypt: bool,
    key: [u8; KEY_SIZE],
    iv: [u8; CIPHER_IV_SIZE],
    buffer: Vec<u8>,
    raw_size: u32,
    quick_hmac: HmacSha256,
    quick_hashed: usize,
    full_hmac: HmacSha256,
}

impl<W: Write> Encrypter<W> {
    /// Writes the container header and returns the ready writer. The
    /// derivator is conventionally the base name of the target file.
    pub fn new(
        inner: W,
        context: &CryptoContext,
        derivator: &[u8],
        random: &mut dyn RandomSource,
    ) -> Result<Self, Error> {
        let mut header_iv = [0u8; HEADER_IV_SIZE];
        random.fill(&mut header_iv);
        let mut iv = [0u8; CIPHER_IV_SIZE];
        iv.copy_from_slice(&header_iv[..CIPHER_IV_SIZE]);

        let hmac = HmacSha256::new_from_slice(context.hmac_key())
            .expect("HMAC accepts keys of any length");

        let mut encrypter = Self {
            inner,
            encrypt: true,
            key: context.cipher_key(derivator),
            iv,
            buffer: Vec::with_capacity(CLEAR_CHUNK_SIZE),
            raw_size: 0,
            quick_hmac: hmac.clone(),
            quick_hashed: 0,
            full_hmac: hmac,
        };

        encrypter.store(&MAGIC.to_le_bytes())?;
        encrypter.store(&VERSION.to_le_bytes())?;
        encrypter.store(&header_iv)?;
        Ok(encrypter)
    }

    /// Pass-through writer: bytes are stored as given, with no header,
    /// chunking or trailer, but the integrity digests are still maintained
    /// over the stored bytes.
    pub fn plain(inner: W, context: &CryptoContext) -> Self {
        let hmac = HmacSha256::new_from_slice(context.hmac_key())
            .expect("HMAC accepts keys of any length");
        Self {
            inner,
            encrypt: false,
            key: [0u8; KEY_SIZE],
            iv: [0u8; CIPHER_IV_SIZE],
            buffer: Vec::new(),
            raw_size: 0,
            quick_hmac: hmac.clone(),
            quick_hashed: 0,
            full_hmac: hmac,
        }
    }

    /// Buffers plaintext, flushing full chunks as they complete.
    pub fn write(&mut self, mut data: &[u8]) -> Result<(), Error> {
        if !self.encrypt {
            self.raw_size = self.raw_size.wrapping_add(data.len() as u32);
            return self.store(data);
        }

        while !data.is_empty() {
            let room = CLEAR_CHUNK_SIZE - self.buffer.len();
            let take = room.min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            self.raw_size = self.raw_size.wrapping_add(take as u32);
            data = &data[take..];

            if self.buffer.len() == CLEAR_CHUNK_SIZE {
                self.flush_chunk()?;
            }
        }
        Ok(())
    }

    /// Flushes the pending chunk, writes the trailer and returns the
    /// underlying writer along with the integrity digests.
    pub fn finish(mut self) -> Result<(W, Hashes), Error> {
        if self.encrypt {
            if !self.buffer.is_empty() {
                self.flush_chunk()?;
            }
            let raw_size = self.raw_size;
            self.store(&EOF_MAGIC.to_le_bytes())?;
            self.store(&raw_size.to_le_bytes())?;
        }
        self.inner.flush()?;

        let hashes = Hashes {
            quick: self.quick_hmac.finalize().into_bytes().into(),
            full: self.full_hmac.finalize().into_bytes().into(),
        };
        Ok((self.inner, hashes))
    }

    fn flush_chunk(&mut self) -> Result<(), Error> {
        let compressed = snap::raw::Encoder::new().compress_vec(&self.buffer)?;
        let ciphered = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(&compressed);

        let max = max_ciphered_size();
        if ciphered.len() > max {
            return Err(Error::ChunkTooLarge {
                len: ciphered.len(),
                max,
            });
        }

        // Bounded by the max check above, the length always fits 32 bits.
        self.store(&(ciphered.len() as u32).to_le_bytes())?;
        self.store(&ciphered)?;
        self.buffer.clear();
        Ok(())
    }

    /// Writes to storage and feeds both running digests.
    fn store(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.inner.write_all(bytes)?;
        self.full_hmac.update(bytes);
        if self.quick_hashed < QUICK_HASH_SIZE {
            let take = (QUICK_HASH_SIZE - self.quick_hashed).min(bytes.len());
            self.quick_hmac.update(&bytes[..take]);
            self.quick_hashed += take;
        }
        Ok(())
    }
}
