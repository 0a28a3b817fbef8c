use std::io::Read;

use cryptofile::{
    max_ciphered_size, CryptoContext, Decrypter, Encrypter, EncryptionMode, Error, LcgRandom,
    OsRandom, RandomSource,
};

const MASTER_KEY: &str = "611fd4cde595b7fda65038fcd886514f597e8e9081f6f4489c7741510f530ee8";
const HMAC_KEY: &str = "86410558c495cc4e492157874774088a33b02ab865cc384120fec2c9b872c82c";

// "toto" under the keys above, derivator "ABCD", IVs from LcgRandom(0).
const TOTO_CONTAINER: &str = concat!(
    "5743464d",                                                         // magic
    "01000000",                                                         // version
    "b86cdaa6f0f6308da816a66ee0c3e5cc9876ddf5d026745f884cc250c0dfc950", // header IV
    "10000000",                                                         // chunk length
    "26f6391714457e3bfafc118ac092f753",                                 // chunk
    "4d464357",                                                         // trailer magic
    "04000000",                                                         // plaintext length
);
const TOTO_HASH: &str = "295c52cdf69992c3fe2f05900b6292dd12312d3e1d17d3fd8e9c3b52cd1df729";

fn context() -> CryptoContext {
    let master: [u8; 32] = hex::decode(MASTER_KEY).unwrap().try_into().unwrap();
    let hmac: [u8; 32] = hex::decode(HMAC_KEY).unwrap().try_into().unwrap();
    CryptoContext::new(master, hmac)
}

#[test]
fn known_container_bytes_and_hashes() {
    let mut rng = LcgRandom::new(0);
    let mut encrypter = Encrypter::new(Vec::new(), &context(), b"ABCD", &mut rng).unwrap();
    encrypter.write(b"toto").unwrap();
    let (bytes, hashes) = encrypter.finish().unwrap();

    assert_eq!(hex::encode(&bytes), TOTO_CONTAINER);
    assert_eq!(hex::encode(hashes.quick), TOTO_HASH);
    // 68 bytes stored, well within the quick window.
    assert_eq!(hashes.quick, hashes.full);
}

#[test]
fn known_container_decrypts() {
    let bytes = hex::decode(TOTO_CONTAINER).unwrap();
    let mut reader =
        Decrypter::open(bytes.as_slice(), &context(), b"ABCD", EncryptionMode::Auto).unwrap();
    let mut clear = Vec::new();
    reader.read_to_end(&mut clear).unwrap();
    assert_eq!(clear, b"toto");
}

#[test]
fn empty_chunk_ends_the_stream() {
    use aes::cipher::block_padding::Pkcs7;
    use aes::cipher::{BlockEncryptMut, KeyIvInit};

    // Older recordings stop at a chunk holding zero plaintext bytes
    // instead of writing a trailer.
    let context = context();
    let mut bytes = hex::decode(TOTO_CONTAINER).unwrap();
    bytes.truncate(bytes.len() - 8);

    let key = context.cipher_key(b"ABCD");
    let iv: [u8; 16] = bytes[8..24].try_into().unwrap();
    let compressed = snap::raw::Encoder::new().compress_vec(&[]).unwrap();
    let ciphered = cbc::Encryptor::<aes::Aes256>::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(&compressed);
    bytes.extend_from_slice(&(ciphered.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&ciphered);
    // Anything after the empty chunk must never be parsed.
    bytes.extend_from_slice(b"junk");

    let mut reader =
        Decrypter::open(bytes.as_slice(), &context, b"ABCD", EncryptionMode::Encrypted).unwrap();
    let mut clear = Vec::new();
    reader.read_to_end(&mut clear).unwrap();
    assert_eq!(clear, b"toto");
}

#[test]
fn round_trips_across_chunk_boundaries() {
    let context = context();
    for size in [0usize, 1, 4095, 4096, 16384, 16385, 100_000] {
        let mut payload = vec![0u8; size];
        LcgRandom::new(size as u32).fill(&mut payload);

        let mut rng = OsRandom;
        let mut encrypter =
            Encrypter::new(Vec::new(), &context, b"capture.wrm", &mut rng).unwrap();
        encrypter.write(&payload).unwrap();
        let (bytes, _) = encrypter.finish().unwrap();

        let mut reader = Decrypter::open(
            bytes.as_slice(),
            &context,
            b"capture.wrm",
            EncryptionMode::Encrypted,
        )
        .unwrap();
        let mut clear = Vec::new();
        reader.read_to_end(&mut clear).unwrap();
        assert_eq!(clear, payload, "size {size}");
    }
}

#[test]
fn split_writes_match_single_write() {
    let context = context();
    let mut payload = vec![0u8; 40_000];
    LcgRandom::new(7).fill(&mut payload);

    let mut rng = LcgRandom::new(1);
    let mut whole = Encrypter::new(Vec::new(), &context, b"x", &mut rng).unwrap();
    whole.write(&payload).unwrap();
    let (whole_bytes, whole_hashes) = whole.finish().unwrap();

    let mut rng = LcgRandom::new(1);
    let mut pieces = Encrypter::new(Vec::new(), &context, b"x", &mut rng).unwrap();
    for part in payload.chunks(777) {
        pieces.write(part).unwrap();
    }
    let (piece_bytes, piece_hashes) = pieces.finish().unwrap();

    assert_eq!(whole_bytes, piece_bytes);
    assert_eq!(whole_hashes, piece_hashes);
}

#[test]
fn plain_writer_stores_bytes_verbatim_but_still_hashes() {
    let context = context();
    let mut writer = Encrypter::plain(Vec::new(), &context);
    writer.write(b"toto").unwrap();
    let (bytes, hashes) = writer.finish().unwrap();

    assert_eq!(bytes, b"toto");
    assert_eq!(hashes.quick, hashes.full);

    // Same digests the verification side computes over stored bytes.
    let mut rng = LcgRandom::new(0);
    let mut encrypter = Encrypter::new(Vec::new(), &context, b"toto", &mut rng).unwrap();
    encrypter.write(b"toto").unwrap();
    let (_, encrypted_hashes) = encrypter.finish().unwrap();
    assert_ne!(hashes.full, encrypted_hashes.full);
}

#[test]
fn auto_mode_passes_plain_files_through() {
    let context = context();
    for payload in [&b"plain text, no magic here"[..], b"ab", b""] {
        let mut reader =
            Decrypter::open(payload, &context, b"x", EncryptionMode::Auto).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }
}

#[test]
fn not_encrypted_mode_returns_stored_bytes() {
    let bytes = hex::decode(TOTO_CONTAINER).unwrap();
    let mut reader =
        Decrypter::open(bytes.as_slice(), &context(), b"ABCD", EncryptionMode::NotEncrypted)
            .unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn encrypted_mode_rejects_other_content() {
    let context = context();

    let err = Decrypter::open(&b"not a container"[..], &context, b"x", EncryptionMode::Encrypted)
        .unwrap_err();
    assert!(matches!(err, Error::BadMagic { .. }));

    let err =
        Decrypter::open(&b"WC"[..], &context, b"x", EncryptionMode::Encrypted).unwrap_err();
    assert!(matches!(err, Error::Truncated));
}

#[test]
fn future_version_is_rejected() {
    let mut bytes = hex::decode(TOTO_CONTAINER).unwrap();
    bytes[4] = 2;
    let err = Decrypter::open(bytes.as_slice(), &context(), b"ABCD", EncryptionMode::Auto)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { version: 2 }));
}

#[test]
fn oversized_chunk_is_rejected() {
    let mut bytes = hex::decode(TOTO_CONTAINER).unwrap()[..40].to_vec();
    let bad_len = u32::try_from(max_ciphered_size() + 1).unwrap();
    bytes.extend_from_slice(&bad_len.to_le_bytes());

    let mut reader =
        Decrypter::open(bytes.as_slice(), &context(), b"ABCD", EncryptionMode::Auto).unwrap();
    let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn truncated_container_is_reported() {
    let bytes = hex::decode(TOTO_CONTAINER).unwrap();
    let mut reader =
        Decrypter::open(&bytes[..50], &context(), b"ABCD", EncryptionMode::Auto).unwrap();
    let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn corrupted_chunk_fails_decryption() {
    let mut bytes = hex::decode(TOTO_CONTAINER).unwrap();
    bytes[45] ^= 0xFF;
    let mut reader =
        Decrypter::open(bytes.as_slice(), &context(), b"ABCD", EncryptionMode::Auto).unwrap();
    let mut out = Vec::new();
    match reader.read_to_end(&mut out) {
        Ok(_) => assert_ne!(out, b"toto"),
        Err(_) => {}
    }
}

#[test]
fn wrong_derivator_yields_garbage_or_error() {
    let bytes = hex::decode(TOTO_CONTAINER).unwrap();
    let mut reader =
        Decrypter::open(bytes.as_slice(), &context(), b"WXYZ", EncryptionMode::Auto).unwrap();
    let mut out = Vec::new();
    match reader.read_to_end(&mut out) {
        Ok(_) => assert_ne!(out, b"toto"),
        Err(_) => {}
    }
}
