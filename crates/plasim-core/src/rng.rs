//! Seeding of independent per-worker random streams.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Random source used by every worker.
pub type WorkerRng = Xoshiro256PlusPlus;

/// Derive the seed of stream `index` from a master seed.
///
/// SplitMix64 finalizer over `seed + (index + 1) * golden`, so neighbouring
/// indices land on unrelated seeds.
pub fn stream_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Create the random source of stream `index`.
pub fn stream_rng(seed: u64, index: u64) -> WorkerRng {
    WorkerRng::seed_from_u64(stream_seed(seed, index))
}
