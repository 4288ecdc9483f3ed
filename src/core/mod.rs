//! Core primitives shared by both engines.
//!
//! Everything that introduces nondeterminism (randomness, wall time) lives
//! here behind an injectable seam.

pub mod rng;
pub mod hash;
pub mod clock;

// Re-export core types
pub use rng::{DeterministicRng, RandomSource};
pub use hash::{StateHash, StateHasher};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, TimestampMs};
