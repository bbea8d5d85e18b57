//! Segment-count growth: how many segments a stream of increasing length needs.

use crate::config::GrowthConfig;
use crate::error::Result;
use crate::harness::Experiment;
use crate::output::{CsvReport, Preamble};
use plasim_core::rng::WorkerRng;
use plasim_core::{ExitTimeSimulator, GapModel, RunningStat, SimError};
use serde::Serialize;

pub const CSV_HEADER: &str = "n,segments_avg,segments_std";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthRow {
    /// Stream length.
    pub n: u64,
    pub segments_avg: f64,
    pub segments_std: f64,
}

/// Segment counts per stream position.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthTable {
    step: u64,
    positions: Vec<RunningStat>,
}

impl GrowthTable {
    pub fn new(config: &GrowthConfig) -> Self {
        Self {
            step: config.step.max(1),
            positions: vec![RunningStat::new(); config.positions()],
        }
    }

    pub fn positions(&self) -> &[RunningStat] {
        &self.positions
    }
}

impl CsvReport for GrowthTable {
    type Row = GrowthRow;

    fn header(&self) -> &'static str {
        CSV_HEADER
    }

    fn rows(&self) -> Vec<GrowthRow> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, stat)| GrowthRow {
                n: if i == 0 { 1 } else { i as u64 * self.step },
                segments_avg: stat.mean(),
                segments_std: stat.standard_deviation(),
            })
            .collect()
    }

    fn format_row(r: &GrowthRow) -> String {
        format!("{},{},{}", r.n, r.segments_avg, r.segments_std)
    }
}

/// Segment-count growth experiment over a gap distribution.
#[derive(Debug, Clone)]
pub struct GrowthExperiment<D> {
    simulator: ExitTimeSimulator<D>,
    config: GrowthConfig,
}

impl<D: GapModel> GrowthExperiment<D> {
    pub fn new(gaps: D, config: GrowthConfig) -> Result<Self> {
        config.validate()?;
        let simulator = ExitTimeSimulator::new(gaps, config.correlation)?;
        Ok(Self { simulator, config })
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn preamble(&self) -> Preamble {
        let theory = self.simulator.theory();
        let mut preamble = Preamble::default();
        preamble.push("mean", theory.mean);
        preamble.push("variance", theory.variance);
        preamble.push("epsilon", self.config.epsilon);
        preamble.push("algorithm", self.config.algorithm.name());
        preamble.push("met constant", theory.met_constant);
        preamble
    }
}

impl<D: GapModel> Experiment for GrowthExperiment<D> {
    type Outcome = Vec<u64>;
    type Aggregate = GrowthTable;

    fn aggregate(&self) -> GrowthTable {
        GrowthTable::new(&self.config)
    }

    fn trial(&self, rng: &mut WorkerRng) -> std::result::Result<Vec<u64>, SimError> {
        self.simulator.count_segments(
            self.config.algorithm,
            self.config.epsilon as f64,
            self.config.length,
            self.config.step,
            rng,
        )
    }

    fn fold(&self, table: &mut GrowthTable, counts: Vec<u64>) {
        for (stat, count) in table.positions.iter_mut().zip(counts) {
            stat.push(count as f64);
        }
    }
}
