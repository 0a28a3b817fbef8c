use std::io::Read;

use cryptofile::{CryptoContext, Decrypter, Encrypter, EncryptionMode, OsRandom};
use proptest::prelude::*;

fn context() -> CryptoContext {
    CryptoContext::new([0x42; 32], [0x24; 32])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_payload_round_trips(payload in prop::collection::vec(any::<u8>(), 0..60_000)) {
        let context = context();
        let mut rng = OsRandom;
        let mut encrypter = Encrypter::new(Vec::new(), &context, b"file.wrm", &mut rng).unwrap();
        encrypter.write(&payload).unwrap();
        let (bytes, _) = encrypter.finish().unwrap();

        let mut reader = Decrypter::open(
            bytes.as_slice(),
            &context,
            b"file.wrm",
            EncryptionMode::Encrypted,
        )
        .unwrap();
        let mut clear = Vec::new();
        reader.read_to_end(&mut clear).unwrap();
        prop_assert_eq!(clear, payload);
    }
}
