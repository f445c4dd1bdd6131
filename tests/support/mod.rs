//! Shared helpers for the integration suite: a tiny deterministic PRNG
//! for randomized-trace property tests (no external dependency) and a
//! couple of small arithmetic helpers mirroring the allocator's own
//! size adjustment so tests can reason about exact block sizes using
//! only the crate's public constants.

use segalloc::{FSZ, HSZ, MIN_BLOCK_SIZE};

/// A xorshift64* generator. Not cryptographic; just deterministic and
/// fast, which is all a reproducible randomized trace needs.
pub struct Xorshift64 {
  state: u64,
}

impl Xorshift64 {
  pub fn new(seed: u64) -> Self {
    Xorshift64 { state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed } }
  }

  pub fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x.wrapping_mul(0x2545F4914F6CDD1D)
  }

  /// Uniform value in `[0, bound)`. `bound` must be nonzero.
  pub fn next_below(&mut self, bound: usize) -> usize {
    (self.next_u64() as usize) % bound
  }

  pub fn next_bool(&mut self) -> bool {
    self.next_u64() & 1 == 0
  }
}

/// The adjusted block size `allocate(n)` computes internally, derived
/// purely from the crate's public size constants.
pub fn adjusted_size(n: usize) -> usize {
  let round_up = |x: usize| (x + 7) & !7;
  round_up(n + HSZ + FSZ).max(MIN_BLOCK_SIZE)
}

/// The payload capacity of a block carved for a request of `n` bytes —
/// always `>= n`, since splitting never leaves a remainder smaller than
/// `MIN_BLOCK_SIZE`.
pub fn payload_capacity(n: usize) -> usize {
  adjusted_size(n) - HSZ - FSZ
}
