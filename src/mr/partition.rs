//! The partitioner: a pure function mapping a key to a reducer index.
//!
//! `DefaultHasher` is deterministic for a given seed, but the seed
//! `HashMap`/`RandomState` would otherwise pick is randomized per process
//! (see <https://doc.rust-lang.org/std/collections/struct.RandomState.html>).
//! Since every mapper runs in its own OS process, a per-process-random seed
//! would make two mappers compute different reducer indices for the same
//! key. We fix the seed instead.

use std::hash::{Hash, Hasher};

/// Arbitrary but fixed seed keys for the partitioner's hasher. Must never
/// change within a single deployment of this crate, or cross-run reducer
/// assignment would no longer be stable.
const SEED_0: u64 = 0x9E37_79B9_7F4A_7C15;
const SEED_1: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// `partition(key) = H(key) mod reducers`. `reducers` must be at least 1.
pub fn partition(key: &str, reducers: usize) -> usize {
    assert!(reducers > 0, "reducer count must be at least 1");
    let mut hasher = seeded_hasher();
    key.hash(&mut hasher);
    (hasher.finish() % reducers as u64) as usize
}

fn seeded_hasher() -> impl Hasher {
    SeededHasher {
        state: SEED_0 ^ SEED_1,
    }
}

/// A small FNV-1a-style hasher seeded with fixed constants, used instead of
/// `std::collections::hash_map::DefaultHasher` so the seed is an explicit,
/// documented part of this crate rather than an implementation detail of the
/// standard library that could change between compiler versions.
struct SeededHasher {
    state: u64,
}

impl Hasher for SeededHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }
}
