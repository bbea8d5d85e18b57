//! Number of segments needed by streams of increasing length.
//!
//! # Usage
//!
//! ```bash
//! # MET segments of uniform streams up to 10^6 keys, reported every 1000 keys
//! cargo run --release --bin segments-count -- uniform 0 1 -n 1000000 -s 1000 -i 10000
//!
//! # Same with the optimal algorithm
//! cargo run --release --bin segments-count -- uniform 0 1 -n 1000000 -s 1000 --algorithm opt
//! ```

use clap::{Parser, ValueEnum};
use plasim_bench::cli::{self, CorrelationArgs, DistributionArg, OutputArgs, RunArgs};
use plasim_bench::config::{GrowthConfig, RunSettings};
use plasim_bench::growth::GrowthExperiment;
use plasim_bench::harness::MonteCarlo;
use plasim_core::constants::{DEFAULT_EPSILON_STEP, DEFAULT_GROWTH_EPSILON};
use plasim_core::{Algorithm, GapSource};
use std::process::ExitCode;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum AlgorithmArg {
    Met,
    Opt,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Met => Algorithm::Met,
            AlgorithmArg::Opt => Algorithm::Opt,
        }
    }
}

/// Count segments on random streams of increasing length
#[derive(Parser, Debug)]
#[command(name = "segments-count")]
#[command(about = "Count segments on random streams of increasing length")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    distribution: DistributionArg,

    /// Maximum length of each stream (required)
    #[arg(short = 'n', long, global = true)]
    length: Option<u64>,

    /// The output contains n/step samples
    #[arg(short = 's', long, global = true, default_value_t = DEFAULT_EPSILON_STEP)]
    step: u64,

    /// Value of ε
    #[arg(short = 'e', long, global = true, default_value_t = DEFAULT_GROWTH_EPSILON)]
    epsilon: u64,

    /// Segmentation algorithm
    #[arg(long, global = true, value_enum, default_value = "met")]
    algorithm: AlgorithmArg,

    #[command(flatten)]
    correlation: CorrelationArgs,

    #[command(flatten)]
    run: RunArgs,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing();

    let Some(length) = args.length else {
        return cli::fail("the stream length `-n <LENGTH>` is required");
    };

    let gaps = match GapSource::new(args.distribution.into()) {
        Ok(gaps) => gaps,
        Err(e) => return cli::fail(e),
    };

    let config = GrowthConfig {
        epsilon: args.epsilon,
        length,
        step: args.step,
        algorithm: args.algorithm.into(),
        correlation: args.correlation.correlation(),
        run: RunSettings {
            iterations: args.run.iterations,
            threads: args.run.threads,
            seed: args.run.seed,
            checkpoint_every: None,
        },
    };

    let experiment = match GrowthExperiment::new(gaps, config.clone()) {
        Ok(experiment) => experiment,
        Err(e) => return cli::fail(e),
    };
    let preamble = experiment.preamble();
    let runner = MonteCarlo::new(experiment, config.run.clone());
    cli::execute(runner, &preamble, args.output, config.run.iterations)
        .unwrap_or_else(cli::fail)
}
