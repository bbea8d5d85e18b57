//! Parallel Monte Carlo harness.
//!
//! [`MonteCarlo`] runs `iterations` independent trials of an [`Experiment`]
//! on a dedicated rayon pool. Each pool thread owns its random stream and
//! claims trials from a shared counter until the budget is exhausted or the
//! [`Control`] token asks it to stop. Outcomes are folded into one aggregate
//! under a single lock, which also serializes checkpoint snapshots.
//!
//! # Example
//!
//! ```ignore
//! use plasim_bench::{harness::MonteCarlo, config::RunSettings};
//!
//! let runner = MonteCarlo::new(experiment, RunSettings::default());
//! let outcome = runner.run(|p| eprintln!("{}/{}", p.completed, p.total))?;
//! ```

use crate::checkpoint::{CheckpointBuffer, Snapshot};
use crate::config::RunSettings;
use crate::control::Control;
use crate::error::{HarnessError, Result};
use crate::output::{CsvReport, RunTotals};
use plasim_core::rng::{stream_rng, WorkerRng};
use plasim_core::SimError;
use rand::Rng;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// One kind of randomized trial and the way its outcomes are aggregated.
pub trait Experiment: Sync {
    type Outcome;
    type Aggregate: Clone + Send + CsvReport;

    /// Empty aggregate.
    fn aggregate(&self) -> Self::Aggregate;

    /// Run one trial.
    ///
    /// A `PreconditionViolation` rejects only this trial; any other error
    /// aborts the run.
    fn trial(&self, rng: &mut WorkerRng) -> std::result::Result<Self::Outcome, SimError>;

    /// Fold one outcome into `aggregate`.
    fn fold(&self, aggregate: &mut Self::Aggregate, outcome: Self::Outcome);
}

/// Progress report passed to the callback after every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

/// Result of a run that was not aborted by an error.
#[derive(Debug, Clone)]
pub struct RunSummary<A> {
    pub aggregate: A,
    /// Trials finished, rejected ones included.
    pub completed: u64,
    /// Trials rejected by a precondition violation.
    pub rejected: u64,
    /// Master seed the worker streams were derived from.
    pub seed: u64,
}

impl<A> RunSummary<A> {
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            completed: self.completed,
            rejected: self.rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome<A> {
    /// Every trial of the budget finished.
    Completed(RunSummary<A>),
    /// The run stopped early on request.
    Interrupted(RunSummary<A>),
}

impl<A> RunOutcome<A> {
    pub fn summary(&self) -> &RunSummary<A> {
        match self {
            RunOutcome::Completed(s) | RunOutcome::Interrupted(s) => s,
        }
    }

    pub fn into_summary(self) -> RunSummary<A> {
        match self {
            RunOutcome::Completed(s) | RunOutcome::Interrupted(s) => s,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted(_))
    }
}

struct Reducer<A> {
    aggregate: A,
    completed: u64,
    rejected: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parallel runner for an [`Experiment`].
pub struct MonteCarlo<E: Experiment> {
    experiment: E,
    settings: RunSettings,
    control: Control,
    checkpoints: CheckpointBuffer<E::Aggregate>,
    dump_to: Mutex<Box<dyn Write + Send>>,
}

impl<E: Experiment> MonteCarlo<E> {
    pub fn new(experiment: E, settings: RunSettings) -> Self {
        Self {
            experiment,
            settings,
            control: Control::new(),
            checkpoints: CheckpointBuffer::new(),
            dump_to: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Send on-demand checkpoint dumps to `out` instead of stderr.
    pub fn with_dump_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.dump_to = Mutex::new(Box::new(out));
        self
    }

    /// Use `control` for interrupt and dump requests.
    pub fn with_control(mut self, control: Control) -> Self {
        self.control = control;
        self
    }

    pub fn experiment(&self) -> &E {
        &self.experiment
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn checkpoints(&self) -> &CheckpointBuffer<E::Aggregate> {
        &self.checkpoints
    }

    /// Run the whole budget.
    ///
    /// `progress` is called from worker threads after every finished trial.
    pub fn run<F>(&self, progress: F) -> Result<RunOutcome<E::Aggregate>>
    where
        F: Fn(Progress) + Sync,
    {
        self.settings.validate()?;
        let total = self.settings.iterations;
        let interval = self.settings.checkpoint_interval();
        let seed = self
            .settings
            .seed
            .unwrap_or_else(|| rand::rng().random::<u64>());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.threads)
            .thread_name(|i| format!("plasim-worker-{i}"))
            .build()?;

        tracing::info!(
            iterations = total,
            threads = self.settings.threads,
            seed,
            checkpoint_interval = interval,
            "starting Monte Carlo run"
        );
        let started = Instant::now();

        let claimed = AtomicU64::new(0);
        let failed = AtomicBool::new(false);
        let reducer = Mutex::new(Reducer {
            aggregate: self.experiment.aggregate(),
            completed: 0,
            rejected: 0,
        });

        let results: Vec<std::result::Result<(), SimError>> = pool.broadcast(|ctx| {
            let mut rng = stream_rng(seed, ctx.index() as u64);
            loop {
                if self.control.is_interrupted() || failed.load(Ordering::Relaxed) {
                    return Ok(());
                }
                if self.control.take_dump_request() {
                    self.dump();
                }
                if claimed.fetch_add(1, Ordering::Relaxed) >= total {
                    return Ok(());
                }

                let outcome = self.experiment.trial(&mut rng);

                let mut state = lock(&reducer);
                match outcome {
                    Ok(outcome) => self.experiment.fold(&mut state.aggregate, outcome),
                    Err(e) if e.is_precondition_violation() => {
                        state.rejected += 1;
                        tracing::debug!(error = %e, "trial rejected");
                    }
                    Err(e) => {
                        failed.store(true, Ordering::Relaxed);
                        return Err(e);
                    }
                }
                state.completed += 1;
                let completed = state.completed;
                if completed % interval == 0 {
                    self.checkpoints.store(Snapshot {
                        completed,
                        rejected: state.rejected,
                        aggregate: state.aggregate.clone(),
                        rendered: state.aggregate.to_csv(),
                    });
                    tracing::debug!(completed, "checkpoint stored");
                }
                drop(state);

                progress(Progress { completed, total });
            }
        });

        if let Some(e) = results.into_iter().find_map(|r| r.err()) {
            return Err(HarnessError::Simulation(e));
        }

        let state = reducer.into_inner().unwrap_or_else(PoisonError::into_inner);
        if state.rejected > 0 {
            tracing::warn!(
                rejected = state.rejected,
                "trials rejected by non-monotone increments"
            );
        }
        let summary = RunSummary {
            aggregate: state.aggregate,
            completed: state.completed,
            rejected: state.rejected,
            seed,
        };

        if self.control.is_interrupted() {
            tracing::warn!(completed = summary.completed, total, "run interrupted");
            Ok(RunOutcome::Interrupted(summary))
        } else {
            tracing::info!(
                completed = summary.completed,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Monte Carlo run finished"
            );
            Ok(RunOutcome::Completed(summary))
        }
    }

    /// Print the latest checkpoint to the dump writer, stderr by default.
    pub fn dump(&self) {
        let mut out = lock(&self.dump_to);
        match self.checkpoints.write_to(&mut *out) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("dump requested before the first checkpoint"),
            Err(e) => tracing::warn!(error = %e, "failed to write checkpoint"),
        }
    }
}
