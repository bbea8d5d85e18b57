//! Monte Carlo experiments over error-bounded piecewise-linear segmentation.
//!
//! This crate drives the algorithms of `plasim-core` over millions of random
//! key streams and over real datasets, and renders the aggregated statistics.
//!
//! # Modules
//!
//! - [`config`]: Validated experiment configurations
//! - [`harness`]: Parallel trial runner with checkpointing and cancellation
//! - [`control`]: Cancellation token and signal handling
//! - [`checkpoint`]: Latest-snapshot buffer
//! - [`exit_times`]: OPT/MET exit times per error bound
//! - [`growth`]: Segment counts of streams of increasing length
//! - [`real_data`]: OPT segment lengths of real datasets
//! - [`output`]: CSV and JSON rendering
//! - [`cli`]: Argument types shared by the binaries
//!
//! # Quick Start
//!
//! ```no_run
//! use plasim_bench::{
//!     config::ExperimentConfig,
//!     exit_times::ExitTimeExperiment,
//!     harness::MonteCarlo,
//!     output::CsvReport,
//! };
//! use plasim_core::{GapDistribution, GapSource};
//!
//! let gaps = GapSource::new(GapDistribution::Uniform { min: 0.0, max: 1.0 }).unwrap();
//! let config = ExperimentConfig::new().iterations(100_000).seed(7);
//! let experiment = ExitTimeExperiment::new(gaps, config.clone()).unwrap();
//! let outcome = MonteCarlo::new(experiment, config.run).run(|_| {}).unwrap();
//! println!("{}", outcome.summary().aggregate.to_csv());
//! ```

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod exit_times;
pub mod growth;
pub mod harness;
pub mod output;
pub mod real_data;

pub use config::{ExperimentConfig, GrowthConfig, RealDataConfig, RunSettings};
pub use control::Control;
pub use error::{HarnessError, Result};
pub use harness::{Experiment, MonteCarlo, Progress, RunOutcome, RunSummary};
