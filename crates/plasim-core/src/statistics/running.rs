//! Running mean and variance using Welford's algorithm.
//!
//! The accumulator folds one observation at a time with O(1) memory, which is
//! what lets the harness aggregate millions of trajectories per error bound
//! without retaining them.

use serde::Serialize;

/// Streaming accumulator of count, mean, variance and total.
///
/// Non-finite observations are folded like any other and propagate into the
/// mean, variance and total.
///
/// # Example
///
/// ```
/// use plasim_core::statistics::RunningStat;
///
/// let mut stat = RunningStat::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stat.push(x);
/// }
/// assert_eq!(stat.samples(), 5);
/// assert!((stat.mean() - 3.0).abs() < 1e-12);
/// assert!((stat.variance() - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStat {
    /// Number of samples seen.
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the current mean.
    m2: f64,
    total: f64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.total += x;
        if self.count == 1 {
            self.mean = x;
            self.m2 = 0.0;
            return;
        }
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn samples(&self) -> u64 {
        self.count
    }

    /// Mean of the observations, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n − 1 denominator), 0 with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Sum of the observations.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Point-in-time copy of the derived statistics.
    pub fn summary(&self) -> StatSummary {
        StatSummary {
            samples: self.samples(),
            mean: self.mean(),
            std: self.standard_deviation(),
        }
    }
}

/// Snapshot of a [`RunningStat`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatSummary {
    pub samples: u64,
    pub mean: f64,
    pub std: f64,
}
