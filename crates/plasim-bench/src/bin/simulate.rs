//! Monte Carlo estimate of OPT and MET exit times.
//!
//! # Usage
//!
//! ```bash
//! # Uniform gaps, ε in 1..=16, one million streams
//! cargo run --release --bin simulate -- uniform 0 1 -i 1000000
//!
//! # Exponential gaps summed over a window of 4, MET only
//! cargo run --release --bin simulate -- exponential 1 -o 4 --met
//!
//! # AR(1) gaps with φ = -0.3, ε in 8..=64 step 8
//! cargo run --release --bin simulate -- gamma 2 1 -a -0.3 -m 8 -M 64 -s 8
//! ```
//!
//! Send SIGUSR1 to print the latest checkpoint to stderr; SIGINT prints it and
//! stops.

use clap::Parser;
use plasim_bench::cli::{self, CorrelationArgs, DistributionArg, OutputArgs, RunArgs};
use plasim_bench::config::{ExperimentConfig, RunSettings};
use plasim_bench::exit_times::ExitTimeExperiment;
use plasim_bench::harness::MonteCarlo;
use plasim_core::constants::{
    DEFAULT_EPSILON_STEP, DEFAULT_MAX_EPSILON, DEFAULT_MIN_EPSILON, INFINITE_EXIT_TIME,
};
use plasim_core::{GapDistribution, GapSource};
use std::process::ExitCode;

/// Simulate the OPT and MET algorithms on random streams
#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Estimate exit times of error-bounded linear models on random key streams")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    distribution: DistributionArg,

    /// Minimum ε value
    #[arg(short = 'm', long, global = true, default_value_t = DEFAULT_MIN_EPSILON)]
    min_epsilon: u64,

    /// Maximum ε value
    #[arg(short = 'M', long, global = true, default_value_t = DEFAULT_MAX_EPSILON)]
    max_epsilon: u64,

    /// Step between sampled ε values
    #[arg(short = 's', long, global = true, default_value_t = DEFAULT_EPSILON_STEP)]
    step: u64,

    /// Run only the MET algorithm
    #[arg(long, global = true)]
    met: bool,

    /// Steps after which an exit time is censored
    #[arg(long, global = true, default_value_t = INFINITE_EXIT_TIME)]
    budget: u64,

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

    let gaps = match GapSource::new(args.distribution.into()) {
        Ok(gaps) => gaps,
        Err(e) => return cli::fail(e),
    };

    let config = ExperimentConfig {
        min_epsilon: args.min_epsilon,
        max_epsilon: args.max_epsilon,
        step: args.step,
        correlation: args.correlation.correlation(),
        met_only: args.met,
        budget: args.budget,
        run: RunSettings {
            iterations: args.run.iterations,
            threads: args.run.threads,
            seed: args.run.seed,
            checkpoint_every: None,
        },
    };

    let experiment = match ExitTimeExperiment::new(gaps, config.clone()) {
        Ok(experiment) => experiment,
        Err(e) => return cli::fail(e),
    };
    let mut preamble = experiment.preamble();
    preamble.push("distribution", GapDistribution::from(args.distribution));

    let runner = MonteCarlo::new(experiment, config.run.clone());
    cli::execute(runner, &preamble, args.output, config.run.iterations)
        .unwrap_or_else(cli::fail)
}
