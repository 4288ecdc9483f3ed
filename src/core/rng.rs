//! Deterministic Random Number Generator
//!
//! Mine placement, arena terrain, spawn search and power-up drops all draw
//! from a [`RandomSource`]. Engines are generic over the source so tests can
//! pin outcomes; production uses the seeded [`DeterministicRng`].

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Source of randomness injected into the engines.
///
/// Only `next_u64` is required; every other draw is derived from it so that
/// two sources producing the same `u64` stream produce the same worlds.
pub trait RandomSource {
    /// Generate the next 64-bit random value.
    fn next_u64(&mut self) -> u64;

    /// Generate a random integer in range [0, max).
    #[inline]
    fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random index in range [0, len).
    #[inline]
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Roll a percentage chance. `percent` of 100 always succeeds.
    #[inline]
    fn chance_percent(&mut self, percent: u32) -> bool {
        self.next_int(100) < percent
    }
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
///
/// # Example
///
/// ```
/// use shared_world::core::rng::{DeterministicRng, RandomSource};
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an RNG for one game mode from the server's base seed.
    pub fn for_mode(base_seed: u64, mode: &str) -> Self {
        Self::new(derive_world_seed(base_seed, mode))
    }
}

impl RandomSource for DeterministicRng {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive an independent world seed for a game mode.
///
/// Both engines are built from one configured base seed; hashing the mode
/// name in keeps their random streams unrelated.
pub fn derive_world_seed(base_seed: u64, mode: &str) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"SHARED_WORLD_SEED_V1");
    hasher.update(base_seed.to_le_bytes());
    hasher.update(mode.as_bytes());

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

/// Source that replays a fixed script of values, cycling when exhausted.
#[cfg(test)]
#[derive(Clone, Debug)]
pub(crate) struct ScriptedRng {
    values: Vec<u64>,
    cursor: usize,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(values: &[u64]) -> Self {
        assert!(!values.is_empty());
        Self { values: values.to_vec(), cursor: 0 }
    }

    /// Every draw returns `value`.
    pub(crate) fn constant(value: u64) -> Self {
        Self::new(&[value])
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

// =============================================================================
// TESTS
// =============================================================================
