//! Single-trajectory exit-time simulation.
//!
//! A trajectory is the stream of points `(x_y, y)` where `y = 1, 2, ...` is the
//! arrival order and `x_y` the cumulative sum of the increments produced by a
//! [`GapProcess`]. The stream is anchored at `(0, 0)`. Two stopping times are
//! measured on the same gap sequence:
//!
//! - **OPT**: the first `y` whose point the [`FeasibleRegion`] refuses, i.e.
//!   the length of the longest ε-bounded segment starting at the origin.
//! - **MET**: the first `y` with `|y − slope·x_y| > ε`, where `slope` is the
//!   fixed theoretical slope of the process.
//!
//! Either time may exceed the step budget; it is then reported as
//! [`ExitTime::Censored`] rather than as a number.

use crate::constants::INFINITE_EXIT_TIME;
use crate::error::Result;
use crate::gaps::{Correlation, GapModel, GapProcess, Theory};
use crate::segmentation::{check_epsilon, Admission, FeasibleRegion, Segmenter};
use rand::Rng;
use serde::Serialize;

/// Step at which a trajectory left the ε-strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitTime {
    Observed(u64),
    /// Not reached within the step budget.
    Censored,
}

impl ExitTime {
    pub fn is_censored(&self) -> bool {
        matches!(self, ExitTime::Censored)
    }

    /// The observed step, if any.
    pub fn observed(&self) -> Option<u64> {
        match *self {
            ExitTime::Observed(t) => Some(t),
            ExitTime::Censored => None,
        }
    }

    /// The observed step, or [`INFINITE_EXIT_TIME`] when censored.
    pub fn or_sentinel(&self) -> u64 {
        self.observed().unwrap_or(INFINITE_EXIT_TIME)
    }
}

/// Outcome of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryResult {
    /// `None` when the segmentation engine was not run (MET-only mode).
    pub opt_exit_time: Option<ExitTime>,
    pub met_exit_time: ExitTime,
    /// Admissible slope interval of the OPT segment when it closed, or when
    /// the budget ran out. `(0, 0)` in MET-only mode.
    pub slope_lo: f64,
    pub slope_hi: f64,
}

/// Which algorithm counts segments in [`ExitTimeSimulator::count_segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Fixed theoretical slope, restarted at every exit.
    #[default]
    Met,
    /// Optimal feasible-region segmentation.
    Opt,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Met => "met",
            Algorithm::Opt => "opt",
        }
    }
}

/// Drives gap processes through the segmentation engine.
#[derive(Debug, Clone)]
pub struct ExitTimeSimulator<D> {
    gaps: D,
    correlation: Correlation,
    theory: Theory,
    met_only: bool,
    budget: u64,
}

impl<D: GapModel> ExitTimeSimulator<D> {
    /// # Errors
    ///
    /// `InvalidParameter` when the correlation parameters are out of range.
    pub fn new(gaps: D, correlation: Correlation) -> Result<Self> {
        let theory = Theory::new(gaps.moments(), &correlation)?;
        Ok(Self {
            gaps,
            correlation,
            theory,
            met_only: false,
            budget: INFINITE_EXIT_TIME,
        })
    }

    /// Skip the segmentation engine and stop at the MET exit.
    pub fn met_only(mut self, met_only: bool) -> Self {
        self.met_only = met_only;
        self
    }

    /// Number of steps after which exit times are censored.
    pub fn budget(mut self, steps: u64) -> Self {
        self.budget = steps;
        self
    }

    pub fn theory(&self) -> &Theory {
        &self.theory
    }

    pub fn gaps(&self) -> &D {
        &self.gaps
    }

    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    pub fn is_met_only(&self) -> bool {
        self.met_only
    }

    /// Run one trajectory with error bound `epsilon`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or non-finite `epsilon`;
    /// `PreconditionViolation` when the process produces a non-positive or
    /// non-finite increment while the segmentation engine is running.
    pub fn run<R: Rng + ?Sized>(&self, epsilon: f64, rng: &mut R) -> Result<TrajectoryResult> {
        let mut region = FeasibleRegion::new(epsilon)?;
        let mut process = GapProcess::new(&self.gaps, &self.correlation, rng);
        let slope = self.theory.slope;

        if !self.met_only {
            region.add_point(0.0, 0.0)?;
        }

        let mut x = 0.0;
        let mut met = ExitTime::Censored;
        for y in 1..self.budget {
            x += process.next_increment(rng);
            let yf = y as f64;

            if met.is_censored() && (yf - slope * x).abs() > epsilon {
                met = ExitTime::Observed(y);
                if self.met_only {
                    return Ok(TrajectoryResult {
                        opt_exit_time: None,
                        met_exit_time: met,
                        slope_lo: 0.0,
                        slope_hi: 0.0,
                    });
                }
            }

            if !self.met_only && region.add_point(x, yf)? == Admission::Break {
                let (slope_lo, slope_hi) = region.slope_range();
                return Ok(TrajectoryResult {
                    opt_exit_time: Some(ExitTime::Observed(y)),
                    met_exit_time: met,
                    slope_lo,
                    slope_hi,
                });
            }
        }

        let (slope_lo, slope_hi) = if self.met_only {
            (0.0, 0.0)
        } else {
            region.slope_range()
        };
        Ok(TrajectoryResult {
            opt_exit_time: (!self.met_only).then_some(ExitTime::Censored),
            met_exit_time: met,
            slope_lo,
            slope_hi,
        })
    }

    /// Count segments along one stream of `length` points.
    ///
    /// Entry `0` of the result is 1 (the segment holding the first point);
    /// entry `i ≥ 1` is the number of segments needed for the first
    /// `i · step` points.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a bad `epsilon`; `PreconditionViolation` as in
    /// [`run`](Self::run) when `algorithm` is [`Algorithm::Opt`].
    pub fn count_segments<R: Rng + ?Sized>(
        &self,
        algorithm: Algorithm,
        epsilon: f64,
        length: u64,
        step: u64,
        rng: &mut R,
    ) -> Result<Vec<u64>> {
        let step = step.max(1);
        let mut counts = vec![0u64; (length / step) as usize + 1];
        counts[0] = 1;

        let mut process = GapProcess::new(&self.gaps, &self.correlation, rng);
        let mut segments = 1u64;

        match algorithm {
            Algorithm::Met => {
                check_epsilon(epsilon)?;
                let slope = self.theory.slope;
                let mut x = 0.0;
                let mut start = 0u64;
                for j in 1..=length {
                    x += process.next_increment(rng);
                    if ((j - start) as f64 - slope * x).abs() > epsilon {
                        segments += 1;
                        x = 0.0;
                        start = j;
                    }
                    if j % step == 0 {
                        counts[(j / step) as usize] = segments;
                    }
                }
            }
            Algorithm::Opt => {
                let mut segmenter = Segmenter::new(epsilon)?;
                segmenter.push(0.0, 0.0)?;
                let mut x = 0.0;
                for j in 1..=length {
                    x += process.next_increment(rng);
                    if segmenter.push(x, j as f64)?.is_some() {
                        segments += 1;
                    }
                    if j % step == 0 {
                        counts[(j / step) as usize] = segments;
                    }
                }
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps::{GapDistribution, GapSource};
    use crate::rng::stream_rng;

    fn uniform() -> GapSource {
        GapSource::new(GapDistribution::Uniform { min: 0.0, max: 1.0 }).unwrap()
    }

    #[test]
    fn test_met_only_skips_opt() {
        let sim = ExitTimeSimulator::new(uniform(), Correlation::None)
            .unwrap()
            .met_only(true);
        let r = sim.run(4.0, &mut stream_rng(1, 0)).unwrap();
        assert_eq!(r.opt_exit_time, None);
        assert!(r.met_exit_time.observed().is_some());
        assert_eq!((r.slope_lo, r.slope_hi), (0.0, 0.0));
    }

    #[test]
    fn test_budget_censors() {
        let sim = ExitTimeSimulator::new(uniform(), Correlation::None)
            .unwrap()
            .budget(10);
        let r = sim.run(1e6, &mut stream_rng(1, 0)).unwrap();
        assert_eq!(r.opt_exit_time, Some(ExitTime::Censored));
        assert_eq!(r.met_exit_time, ExitTime::Censored);
        assert_eq!(r.met_exit_time.or_sentinel(), INFINITE_EXIT_TIME);
        assert!(r.slope_lo <= r.slope_hi);
    }

    #[test]
    fn test_exit_times_positive() {
        let sim = ExitTimeSimulator::new(uniform(), Correlation::None).unwrap();
        let mut rng = stream_rng(3, 0);
        for _ in 0..100 {
            let r = sim.run(2.0, &mut rng).unwrap();
            let opt = r.opt_exit_time.and_then(|t| t.observed()).unwrap();
            assert!(opt >= 2, "OPT admits at least two points after the anchor");
            assert!(r.slope_lo <= r.slope_hi);
        }
    }

    #[test]
    fn test_segment_counts_monotone() {
        let sim = ExitTimeSimulator::new(uniform(), Correlation::None).unwrap();
        for algorithm in [Algorithm::Met, Algorithm::Opt] {
            let counts = sim
                .count_segments(algorithm, 2.0, 1000, 10, &mut stream_rng(5, 0))
                .unwrap();
            assert_eq!(counts.len(), 101);
            assert_eq!(counts[0], 1);
            assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{algorithm:?}");
            assert!(counts[100] > 1);
        }
    }

    #[test]
    fn test_opt_needs_no_more_segments_than_met() {
        let sim = ExitTimeSimulator::new(uniform(), Correlation::None).unwrap();
        let met = sim
            .count_segments(Algorithm::Met, 3.0, 5000, 5000, &mut stream_rng(9, 0))
            .unwrap();
        let opt = sim
            .count_segments(Algorithm::Opt, 3.0, 5000, 5000, &mut stream_rng(9, 0))
            .unwrap();
        assert!(opt[1] <= met[1], "opt {} met {}", opt[1], met[1]);
    }
}
