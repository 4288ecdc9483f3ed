//! State Hashing for Verification
//!
//! Deterministic hashing of world state, used to check that generation and
//! command replay are reproducible from a seed.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for world state.
///
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for the mine-clearing board.
    pub fn for_minefield() -> Self {
        Self::new(b"SHARED_WORLD_MINEFIELD_V1")
    }

    /// Create hasher for the arena.
    pub fn for_arena() -> Self {
        Self::new(b"SHARED_WORLD_ARENA_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with an actor id (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute a world hash.
///
/// The world dimensions are always hashed first; the closure adds the
/// mode-specific contents.
pub fn compute_state_hash<F>(mut hasher: StateHasher, width: u32, height: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    hasher.update_u32(width);
    hasher.update_u32(height);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
