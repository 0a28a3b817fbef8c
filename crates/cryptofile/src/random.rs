use rand::rngs::OsRng;
use rand::RngCore;

/// Source of the random IV material written to container headers.
pub trait RandomSource {
    fn fill(&mut self, buf: &mut [u8]);
}

/// Operating system entropy, the production source.
#[derive(Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// Deterministic generator for reproducible containers in tests and
/// offline tooling. Emits the little-endian words of a 32-bit linear
/// congruential sequence.
#[derive(Debug, Clone)]
pub struct LcgRandom {
    state: u32,
}

impl LcgRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_word(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(0x1544_6FD1).wrapping_add(0xA6DA_6CB8);
        self.state
    }
}

impl RandomSource for LcgRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(4) {
            let word = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}
