//! Experiment configuration.
//!
//! Every experiment is described by an immutable configuration value that is
//! validated once, before any worker starts. Defaults reproduce the classic
//! setup: error bounds 1..=16 in unit steps, ten million trajectories on four
//! threads.

use crate::error::{HarnessError, Result};
use plasim_core::constants::{
    CHECKPOINT_FRACTION, DEFAULT_EPSILON_STEP, DEFAULT_GROWTH_EPSILON, DEFAULT_ITERATIONS,
    DEFAULT_MAX_EPSILON, DEFAULT_MIN_EPSILON, DEFAULT_THREADS, INFINITE_EXIT_TIME,
};
use plasim_core::{Algorithm, Correlation};

/// Settings shared by every Monte Carlo experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Number of independent trials.
    pub iterations: u64,

    /// Number of worker threads.
    pub threads: usize,

    /// Master seed for the per-worker random streams.
    ///
    /// `None` draws a fresh seed from the operating system, so two runs
    /// differ. Set it to make a run reproducible for a fixed thread count.
    pub seed: Option<u64>,

    /// Completed trials between two checkpoint snapshots.
    ///
    /// `None` means one percent of `iterations`, at least one.
    pub checkpoint_every: Option<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            threads: DEFAULT_THREADS,
            seed: None,
            checkpoint_every: None,
        }
    }
}

impl RunSettings {
    /// Effective checkpoint interval.
    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_every
            .unwrap_or(self.iterations / CHECKPOINT_FRACTION)
            .max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return invalid("iterations must be positive");
        }
        if self.threads == 0 {
            return invalid("threads must be positive");
        }
        if self.checkpoint_every == Some(0) {
            return invalid("checkpoint interval must be positive");
        }
        Ok(())
    }
}

/// Configuration of the exit-time experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    // =========================================================================
    // Error bounds
    // =========================================================================
    /// Smallest error bound sampled.
    pub min_epsilon: u64,

    /// Largest error bound sampled (inclusive).
    pub max_epsilon: u64,

    /// Sampled error bounds are `min_epsilon` plus a multiple of `step`.
    pub step: u64,

    // =========================================================================
    // Process and algorithm
    // =========================================================================
    /// Correlation applied to the raw gaps.
    pub correlation: Correlation,

    /// Only measure MET exit times.
    pub met_only: bool,

    /// Steps after which an exit time is censored.
    pub budget: u64,

    // =========================================================================
    // Execution
    // =========================================================================
    pub run: RunSettings,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            min_epsilon: DEFAULT_MIN_EPSILON,
            max_epsilon: DEFAULT_MAX_EPSILON,
            step: DEFAULT_EPSILON_STEP,
            correlation: Correlation::None,
            met_only: false,
            budget: INFINITE_EXIT_TIME,
            run: RunSettings::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epsilon_range(mut self, min: u64, max: u64) -> Self {
        self.min_epsilon = min;
        self.max_epsilon = max;
        self
    }

    pub fn step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    pub fn correlation(mut self, correlation: Correlation) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn met_only(mut self, met_only: bool) -> Self {
        self.met_only = met_only;
        self
    }

    pub fn budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.run.iterations = iterations;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.run.threads = threads;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.run.seed = Some(seed);
        self
    }

    pub fn checkpoint_every(mut self, trials: u64) -> Self {
        self.run.checkpoint_every = Some(trials);
        self
    }

    /// Number of ε buckets, one per integer error bound in the range.
    pub fn buckets(&self) -> usize {
        (self.max_epsilon - self.min_epsilon + 1) as usize
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if self.min_epsilon > self.max_epsilon {
            return invalid("min_epsilon must not exceed max_epsilon");
        }
        if self.step == 0 {
            return invalid("step must be positive");
        }
        if self.budget < 2 {
            return invalid("budget must be at least 2 steps");
        }
        self.correlation.validate()?;
        self.run.validate()
    }
}

/// Configuration of the segment-count growth experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthConfig {
    pub epsilon: u64,

    /// Length of every generated stream.
    pub length: u64,

    /// Counts are reported every `step` points.
    pub step: u64,

    pub algorithm: Algorithm,

    pub correlation: Correlation,

    pub run: RunSettings,
}

impl GrowthConfig {
    pub fn new(length: u64) -> Self {
        Self {
            epsilon: DEFAULT_GROWTH_EPSILON,
            length,
            step: DEFAULT_EPSILON_STEP,
            algorithm: Algorithm::Met,
            correlation: Correlation::None,
            run: RunSettings::default(),
        }
    }

    pub fn epsilon(mut self, epsilon: u64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.run.iterations = iterations;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.run.threads = threads;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.run.seed = Some(seed);
        self
    }

    /// Number of reported stream positions.
    pub fn positions(&self) -> usize {
        (self.length / self.step.max(1)) as usize + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return invalid("stream length must be positive");
        }
        if self.step == 0 {
            return invalid("step must be positive");
        }
        self.correlation.validate()?;
        self.run.validate()
    }
}

/// Configuration of the real-dataset experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct RealDataConfig {
    /// Smallest error bound (inclusive).
    pub min_epsilon: u64,

    /// Largest error bound (exclusive).
    pub max_epsilon: u64,

    pub threads: usize,

    /// Datasets are little-endian `u64` arrays prefixed by their length.
    pub binary: bool,
}

impl Default for RealDataConfig {
    fn default() -> Self {
        Self {
            min_epsilon: DEFAULT_MIN_EPSILON,
            max_epsilon: DEFAULT_MAX_EPSILON,
            threads: DEFAULT_THREADS,
            binary: false,
        }
    }
}

impl RealDataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_epsilon >= self.max_epsilon {
            return invalid("min_epsilon must be below max_epsilon");
        }
        if self.threads == 0 {
            return invalid("threads must be positive");
        }
        Ok(())
    }

    pub fn epsilons(&self) -> impl Iterator<Item = u64> {
        self.min_epsilon..self.max_epsilon
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(HarnessError::InvalidConfig(message.to_string()))
}
