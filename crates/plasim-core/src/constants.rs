//! Constants shared by the simulator and the experiment harness.

/// Default deterministic seed for RNG operations.
///
/// The value `0x706C6173696D` is "plasim" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x706C6173696D;

/// Step budget after which an exit time is considered censored.
///
/// Also the numeric sentinel written for censored exit times when a plain
/// integer is required.
pub const INFINITE_EXIT_TIME: u64 = 1_000_000_000;

// =============================================================================
// Default experiment configuration
// =============================================================================

/// Default smallest error bound sampled by the harness.
pub const DEFAULT_MIN_EPSILON: u64 = 1;

/// Default largest error bound sampled by the harness.
pub const DEFAULT_MAX_EPSILON: u64 = 16;

/// Default granularity of the sampled error bounds.
pub const DEFAULT_EPSILON_STEP: u64 = 1;

/// Default number of simulated trajectories.
pub const DEFAULT_ITERATIONS: u64 = 10_000_000;

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 4;

/// Default error bound of the segment-count growth experiment.
pub const DEFAULT_GROWTH_EPSILON: u64 = 16;

/// Fraction of the iteration budget between two checkpoint snapshots.
pub const CHECKPOINT_FRACTION: u64 = 100;
