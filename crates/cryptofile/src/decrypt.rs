use std::io::{self, Read};

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit};

use crate::context::CryptoContext;
use crate::{max_ciphered_size, Error, CIPHER_IV_SIZE, EOF_MAGIC, HEADER_IV_SIZE, KEY_SIZE, MAGIC, VERSION};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// How to interpret the opening bytes of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Decide from the magic: encrypted container or raw pass-through.
    Auto,
    /// Reject files without the container magic.
    Encrypted,
    /// Treat the file as raw bytes even if it starts with the magic.
    NotEncrypted,
}

#[derive(Debug)]
struct ChunkState {
    key: [u8; KEY_SIZE],
    iv: [u8; CIPHER_IV_SIZE],
    clear: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl ChunkState {
    /// Reads and decodes the next chunk. Sets `eof` when the trailer or
    /// an empty chunk is reached and nothing more will come.
    fn fill<R: Read>(&mut self, inner: &mut R) -> Result<(), Error> {
        let mut word = [0u8; 4];
        inner.read_exact(&mut word).map_err(truncated)?;
        let len = u32::from_le_bytes(word);

        if len == EOF_MAGIC {
            // Trailer: total plaintext size, unused on this path.
            inner.read_exact(&mut word).map_err(truncated)?;
            self.eof = true;
            return Ok(());
        }

        let len = len as usize;
        let max = max_ciphered_size();
        if len > max {
            return Err(Error::ChunkTooLarge { len, max });
        }

        let mut ciphered = vec![0u8; len];
        inner.read_exact(&mut ciphered).map_err(truncated)?;

        // The cipher restarts from the header IV on every chunk, keeping
        // chunks independently decodable.
        let compressed = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphered)
            .map_err(|_| Error::BadPadding)?;
        self.clear = snap::raw::Decoder::new().decompress_vec(&compressed)?;
        self.pos = 0;
        // Older recordings end with an empty chunk instead of a trailer.
        if self.clear.is_empty() {
            self.eof = true;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum State {
    /// Raw file. Bytes consumed during detection are replayed first.
    Plain { pending: Vec<u8> },
    Encrypted(ChunkState),
}

/// Streaming container reader. Implements [`Read`] over the recovered
/// plaintext, or over the raw bytes for unencrypted files.
#[derive(Debug)]
pub struct Decrypter<R: Read> {
    inner: R,
    state: State,
}

impl<R: Read> Decrypter<R> {
    pub fn open(
        mut inner: R,
        context: &CryptoContext,
        derivator: &[u8],
        mode: EncryptionMode,
    ) -> Result<Self, Error> {
        if mode == EncryptionMode::NotEncrypted {
            return Ok(Self {
                inner,
                state: State::Plain { pending: Vec::new() },
            });
        }

        let mut magic = [0u8; 4];
        let got = read_at_most(&mut inner, &mut magic)?;
        if got == 4 && u32::from_le_bytes(magic) == MAGIC {
            let mut word = [0u8; 4];
            inner.read_exact(&mut word).map_err(truncated)?;
            let version = u32::from_le_bytes(word);
            if version > VERSION {
                return Err(Error::UnsupportedVersion { version });
            }

            let mut header_iv = [0u8; HEADER_IV_SIZE];
            inner.read_exact(&mut header_iv).map_err(truncated)?;
            let mut iv = [0u8; CIPHER_IV_SIZE];
            iv.copy_from_slice(&header_iv[..CIPHER_IV_SIZE]);

            tracing::debug!(version, "opened encrypted container");

            return Ok(Self {
                inner,
                state: State::Encrypted(ChunkState {
                    key: context.cipher_key(derivator),
                    iv,
                    clear: Vec::new(),
                    pos: 0,
                    eof: false,
                }),
            });
        }

        if mode == EncryptionMode::Encrypted {
            if got < 4 {
                return Err(Error::Truncated);
            }
            return Err(Error::BadMagic {
                found: u32::from_le_bytes(magic),
            });
        }

        tracing::debug!("no container magic, reading file as plain bytes");
        Ok(Self {
            inner,
            state: State::Plain {
                pending: magic[..got].to_vec(),
            },
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Decrypter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        match &mut self.state {
            State::Plain { pending } => {
                if pending.is_empty() {
                    return self.inner.read(buf);
                }
                let take = pending.len().min(buf.len());
                buf[..take].copy_from_slice(&pending[..take]);
                pending.drain(..take);
                Ok(take)
            }
            State::Encrypted(chunk) => loop {
                if chunk.pos < chunk.clear.len() {
                    let take = (chunk.clear.len() - chunk.pos).min(buf.len());
                    buf[..take].copy_from_slice(&chunk.clear[chunk.pos..chunk.pos + take]);
                    chunk.pos += take;
                    return Ok(take);
                }
                if chunk.eof {
                    return Ok(0);
                }
                chunk.fill(&mut self.inner).map_err(io_error)?;
            },
        }
    }
}

fn read_at_most<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn truncated(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::Truncated
    } else {
        Error::Io(e)
    }
}

fn io_error(e: Error) -> io::Error {
    match e {
        Error::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
