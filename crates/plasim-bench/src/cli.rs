//! Command-line pieces shared by the experiment binaries.

use crate::control::{install_signal_handlers, Control};
use crate::error::Result;
use crate::harness::{Experiment, MonteCarlo, Progress, RunOutcome};
use crate::output::{write_report, Preamble};
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use plasim_core::constants::{DEFAULT_ITERATIONS, DEFAULT_THREADS};
use plasim_core::{Correlation, GapDistribution};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Gap distribution and its positional parameters.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum DistributionArg {
    /// Continuous uniform (min, max)
    Uniform { min: f64, max: f64 },
    /// Pareto (scale k, shape α)
    Pareto { scale: f64, shape: f64 },
    /// Lognormal (µ, σ)
    Lognormal {
        #[arg(allow_negative_numbers = true)]
        mu: f64,
        sigma: f64,
    },
    /// Exponential (rate λ)
    Exponential { rate: f64 },
    /// Gamma (shape k, scale θ)
    Gamma { shape: f64, scale: f64 },
}

impl From<DistributionArg> for GapDistribution {
    fn from(arg: DistributionArg) -> Self {
        match arg {
            DistributionArg::Uniform { min, max } => GapDistribution::Uniform { min, max },
            DistributionArg::Pareto { scale, shape } => GapDistribution::Pareto { scale, shape },
            DistributionArg::Lognormal { mu, sigma } => GapDistribution::Lognormal { mu, sigma },
            DistributionArg::Exponential { rate } => GapDistribution::Exponential { rate },
            DistributionArg::Gamma { shape, scale } => GapDistribution::Gamma { shape, scale },
        }
    }
}

/// Correlation of the gap sequence; at most one of the two.
#[derive(Args, Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrelationArgs {
    /// Sum the last N gaps (moving-average process of order N)
    #[arg(short = 'o', long = "ma-order", global = true, conflicts_with = "ar1_phi")]
    pub ma_order: Option<usize>,

    /// Autoregressive process gap[t] = φ·gap[t-1] + noise[t], with |φ| < 1
    #[arg(short = 'a', long = "ar1-phi", global = true, allow_negative_numbers = true)]
    pub ar1_phi: Option<f64>,
}

impl CorrelationArgs {
    pub fn correlation(&self) -> Correlation {
        match (self.ma_order, self.ar1_phi) {
            (_, Some(phi)) => Correlation::Autoregressive { phi },
            (Some(order), None) => Correlation::MovingAverage { order },
            (None, None) => Correlation::None,
        }
    }
}

/// Trial budget and parallelism.
#[derive(Args, Debug, Clone, Copy, PartialEq)]
pub struct RunArgs {
    /// Number of generated streams
    #[arg(short = 'i', long, global = true, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u64,

    /// Number of threads
    #[arg(short = 't', long, global = true, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Master seed; random when omitted
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

/// Output format and progress display.
#[derive(Args, Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputArgs {
    /// Print the final report, or the checkpoint of an interrupted run, as JSON instead of CSV
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not draw a progress bar on stderr
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

pub fn progress_bar(total: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Progress callback advancing `bar` by one per finished trial.
///
/// Workers report out of order, so the bar counts calls instead of
/// trusting each report's position.
pub fn advance(bar: &ProgressBar) -> impl Fn(Progress) + Sync + '_ {
    move |_| bar.inc(1)
}

/// Run a Monte Carlo experiment from a binary and print its report.
///
/// The CSV preamble is printed before the run starts; the table follows a
/// `# rejected R of C` line. An interrupted run prints its latest checkpoint
/// as CSV to stderr and in the report format to stdout, and exits with
/// status 1.
pub fn execute<E: Experiment>(
    runner: MonteCarlo<E>,
    preamble: &Preamble,
    output: OutputArgs,
    total: u64,
) -> Result<ExitCode> {
    let control: Control = runner.control().clone();
    if !install_signal_handlers(&control) {
        tracing::warn!("signal handlers unavailable; checkpoints cannot be dumped on demand");
    }

    let mut stdout = io::stdout().lock();
    if !output.json {
        stdout.write_all(preamble.render().as_bytes())?;
        stdout.flush()?;
    }

    let bar = progress_bar(total, !output.no_progress);
    let outcome = runner.run(advance(&bar));
    bar.finish_and_clear();

    match outcome? {
        RunOutcome::Completed(summary) => {
            let trials = summary.totals();
            write_report(&mut stdout, preamble, &summary.aggregate, trials, output.json)?;
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Interrupted(_) => {
            runner.checkpoints().write_to(&mut io::stderr().lock())?;
            if let Some(snapshot) = runner.checkpoints().latest() {
                let trials = snapshot.totals();
                write_report(&mut stdout, preamble, &snapshot.aggregate, trials, output.json)?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Report a fatal error the way every binary does.
pub fn fail(error: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {error}");
    ExitCode::FAILURE
}
