//! Seed derivation for origin-keyed selection.
//!
//! Every seed is domain separated so the same origin hashes differently for
//! sticky picks, hashed picks and fake-player buckets.

use std::hash::Hasher;

use rand::Rng;
use twox_hash::XxHash64;

use crate::constants::{HASH_DOMAIN_FAKE_PLAYERS, HASH_DOMAIN_ORIGIN, HASH_DOMAIN_STICKY};

fn xxhash64(domain: u64, bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(domain);
    hasher.write(bytes);
    hasher.finish()
}

/// SplitMix64 finalizer; spreads entropy of two words across all bits.
#[inline]
#[must_use]
pub const fn mix(a: u64, b: u64) -> u64 {
    let mut z = a ^ b.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stable hash of an origin key, used by hashed selection.
#[must_use]
pub fn origin_hash(origin: &str) -> u64 {
    xxhash64(HASH_DOMAIN_ORIGIN, origin.as_bytes())
}

/// Seed for the first weighted pick of a sticky origin.
#[must_use]
pub fn sticky_seed(origin: &str, now_ms: u64) -> u64 {
    mix(xxhash64(HASH_DOMAIN_STICKY, origin.as_bytes()), now_ms)
}

/// Seed for a fake-player draw that holds for one time bucket per origin.
#[must_use]
pub fn bucket_seed(origin: &str, bucket: u64) -> u64 {
    mix(xxhash64(HASH_DOMAIN_FAKE_PLAYERS, origin.as_bytes()), bucket)
}

/// Seed for selections that have no origin to anchor on.
#[must_use]
pub const fn time_seed(now_ms: u64) -> u64 {
    mix(now_ms, HASH_DOMAIN_STICKY)
}

/// Fresh unseeded entropy for random selection.
#[must_use]
pub fn entropy() -> u64 {
    rand::thread_rng().r#gen::<u64>()
}
