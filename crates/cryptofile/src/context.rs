use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::KEY_SIZE;

/// Salt baked into the cipher key derivation. Changing it would orphan
/// every container already on disk.
const KDF_SALT: [u8; 8] = [0x39, 0x30, 0x00, 0x00, 0x31, 0xD4, 0x00, 0x00];
const KDF_ROUNDS: usize = 5;

/// Long lived key material shared by every container of a deployment.
///
/// Each file gets its own cipher key, derived from the master key and a
/// per-file derivator (conventionally the base file name), so leaking one
/// file key compromises neither the master key nor the sibling files.
#[derive(Clone)]
pub struct CryptoContext {
    master_key: [u8; KEY_SIZE],
    hmac_key: [u8; KEY_SIZE],
}

impl CryptoContext {
    pub fn new(master_key: [u8; KEY_SIZE], hmac_key: [u8; KEY_SIZE]) -> Self {
        Self { master_key, hmac_key }
    }

    pub fn hmac_key(&self) -> &[u8; KEY_SIZE] {
        &self.hmac_key
    }

    /// Per-file key: SHA-256 over the first eight bytes of the hashed
    /// derivator followed by the master key.
    pub fn trace_key(&self, derivator: &[u8]) -> [u8; KEY_SIZE] {
        let derivator_hash = Sha256::digest(derivator);
        let mut hasher = Sha256::new();
        hasher.update(&derivator_hash[..8]);
        hasher.update(self.master_key);
        hasher.finalize().into()
    }

    /// AES-256 key for one file, stretched from the trace key with the
    /// OpenSSL EVP_BytesToKey construction over SHA-1.
    pub fn cipher_key(&self, derivator: &[u8]) -> [u8; KEY_SIZE] {
        evp_bytes_to_key(&self.trace_key(derivator))
    }
}

impl std::fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("CryptoContext").finish_non_exhaustive()
    }
}

/// EVP_BytesToKey with SHA-1 and five rounds: each 20-byte block is
/// `H^rounds(previous || data || salt)`, concatenated until the key is full.
fn evp_bytes_to_key(data: &[u8]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    let mut filled = 0;
    let mut previous: Option<[u8; 20]> = None;

    while filled < KEY_SIZE {
        let mut hasher = Sha1::new();
        if let Some(block) = previous {
            hasher.update(block);
        }
        hasher.update(data);
        hasher.update(KDF_SALT);
        let mut digest: [u8; 20] = hasher.finalize().into();
        for _ in 1..KDF_ROUNDS {
            digest = Sha1::digest(digest).into();
        }

        let take = (KEY_SIZE - filled).min(digest.len());
        key[filled..filled + take].copy_from_slice(&digest[..take]);
        filled += take;
        previous = Some(digest);
    }

    key
}
