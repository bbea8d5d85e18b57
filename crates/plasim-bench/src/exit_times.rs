//! Exit-time experiment: OPT and MET stopping times per error bound.
//!
//! Each trial draws an error bound ε from the configured range, simulates one
//! trajectory and folds its exit times into the ε bucket. A trajectory whose
//! OPT exit was censored is not folded at all; in MET-only mode, a censored MET
//! exit is not folded. Every OPT segment starts at the anchor, so the MET line
//! stays feasible until it exits and an observed OPT exit always comes with an
//! observed MET exit no later than it.

use crate::config::ExperimentConfig;
use crate::error::Result;
use crate::harness::Experiment;
use crate::output::{CsvReport, Preamble};
use plasim_core::rng::WorkerRng;
use plasim_core::{ExitTime, ExitTimeSimulator, GapModel, RunningStat, SimError, TrajectoryResult};
use rand::Rng;
use serde::Serialize;

pub const CSV_HEADER: &str = "epsilon,opt_avg,opt_std,opt_lo_avg,opt_lo_std,opt_hi_avg,opt_hi_std,met_avg,met_std,samples";

pub const MET_ONLY_CSV_HEADER: &str = "epsilon,met_avg,met_std,samples";

/// Snap a uniform offset in `[0, span]` to the nearest multiple of `step`,
/// clamped to `span`, and shift it by `min`.
pub fn snap_epsilon(offset: u64, min: u64, span: u64, step: u64) -> u64 {
    let nearest = (offset + step / 2) / step * step;
    min + nearest.min(span)
}

/// Statistics of one ε bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    pub opt: RunningStat,
    pub opt_lo: RunningStat,
    pub opt_hi: RunningStat,
    pub met: RunningStat,
    /// Folded trajectories.
    pub samples: u64,
}

/// One output row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExitTimeRow {
    pub epsilon: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt: Option<AvgStd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_lo: Option<AvgStd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_hi: Option<AvgStd>,
    pub met: AvgStd,
    pub samples: u64,
}

/// Mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvgStd {
    pub avg: f64,
    pub std: f64,
}

impl From<&RunningStat> for AvgStd {
    fn from(stat: &RunningStat) -> Self {
        Self {
            avg: stat.mean(),
            std: stat.standard_deviation(),
        }
    }
}

/// Per-ε aggregate of the exit-time experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitTimeTable {
    min_epsilon: u64,
    step: u64,
    met_only: bool,
    buckets: Vec<Bucket>,
}

impl ExitTimeTable {
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            min_epsilon: config.min_epsilon,
            step: config.step,
            met_only: config.met_only,
            buckets: vec![Bucket::default(); config.buckets()],
        }
    }

    /// Bucket of error bound `epsilon`.
    pub fn bucket(&self, epsilon: u64) -> Option<&Bucket> {
        epsilon
            .checked_sub(self.min_epsilon)
            .and_then(|j| self.buckets.get(j as usize))
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Folded trajectories over all buckets.
    pub fn total_samples(&self) -> u64 {
        self.buckets.iter().map(|b| b.samples).sum()
    }

    fn fold(&mut self, epsilon: u64, result: TrajectoryResult) {
        let Some(bucket) = epsilon
            .checked_sub(self.min_epsilon)
            .and_then(|j| self.buckets.get_mut(j as usize))
        else {
            return;
        };
        if self.met_only {
            if let ExitTime::Observed(t) = result.met_exit_time {
                bucket.met.push(t as f64);
                bucket.samples += 1;
            }
            return;
        }
        if let Some(ExitTime::Observed(opt)) = result.opt_exit_time {
            bucket.opt.push(opt as f64);
            bucket.opt_lo.push(result.slope_lo);
            bucket.opt_hi.push(result.slope_hi);
            if let ExitTime::Observed(t) = result.met_exit_time {
                bucket.met.push(t as f64);
            }
            bucket.samples += 1;
        }
    }
}

impl CsvReport for ExitTimeTable {
    type Row = ExitTimeRow;

    fn header(&self) -> &'static str {
        if self.met_only {
            MET_ONLY_CSV_HEADER
        } else {
            CSV_HEADER
        }
    }

    fn rows(&self) -> Vec<ExitTimeRow> {
        let step = self.step.max(1) as usize;
        let full = !self.met_only;
        self.buckets
            .iter()
            .enumerate()
            .step_by(step)
            .map(|(j, b)| ExitTimeRow {
                epsilon: self.min_epsilon + j as u64,
                opt: full.then(|| (&b.opt).into()),
                opt_lo: full.then(|| (&b.opt_lo).into()),
                opt_hi: full.then(|| (&b.opt_hi).into()),
                met: (&b.met).into(),
                samples: b.samples,
            })
            .collect()
    }

    fn format_row(r: &ExitTimeRow) -> String {
        match (r.opt, r.opt_lo, r.opt_hi) {
            (Some(opt), Some(lo), Some(hi)) => format!(
                "{},{},{},{},{},{},{},{},{},{}",
                r.epsilon,
                opt.avg,
                opt.std,
                lo.avg,
                lo.std,
                hi.avg,
                hi.std,
                r.met.avg,
                r.met.std,
                r.samples
            ),
            _ => format!("{},{},{},{}", r.epsilon, r.met.avg, r.met.std, r.samples),
        }
    }
}

/// Exit-time experiment over a gap distribution.
#[derive(Debug, Clone)]
pub struct ExitTimeExperiment<D> {
    simulator: ExitTimeSimulator<D>,
    config: ExperimentConfig,
}

impl<D: GapModel> ExitTimeExperiment<D> {
    /// # Errors
    ///
    /// `InvalidConfig` or `Simulation` when the configuration or correlation
    /// parameters are invalid.
    pub fn new(gaps: D, config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let simulator = ExitTimeSimulator::new(gaps, config.correlation)?
            .met_only(config.met_only)
            .budget(config.budget);
        Ok(Self { simulator, config })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn simulator(&self) -> &ExitTimeSimulator<D> {
        &self.simulator
    }

    pub fn preamble(&self) -> Preamble {
        Preamble::for_process(self.simulator.theory(), &self.config.correlation)
    }

    fn draw_epsilon(&self, rng: &mut WorkerRng) -> u64 {
        let span = self.config.max_epsilon - self.config.min_epsilon;
        let offset = rng.random_range(0..=span);
        snap_epsilon(offset, self.config.min_epsilon, span, self.config.step)
    }
}

impl<D: GapModel> Experiment for ExitTimeExperiment<D> {
    type Outcome = (u64, TrajectoryResult);
    type Aggregate = ExitTimeTable;

    fn aggregate(&self) -> ExitTimeTable {
        ExitTimeTable::new(&self.config)
    }

    fn trial(&self, rng: &mut WorkerRng) -> std::result::Result<Self::Outcome, SimError> {
        let epsilon = self.draw_epsilon(rng);
        let result = self.simulator.run(epsilon as f64, rng)?;
        Ok((epsilon, result))
    }

    fn fold(&self, table: &mut ExitTimeTable, (epsilon, result): Self::Outcome) {
        table.fold(epsilon, result);
    }
}
