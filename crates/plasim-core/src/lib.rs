//! Exit-time simulation for error-bounded piecewise-linear models.
//!
//! This crate provides the algorithmic core behind the `plasim` experiments:
//! how long a single line can track a random stream of increasing keys within
//! a vertical error bound ε, either with a fixed theoretical slope (MET) or
//! with the optimal feasible-region algorithm (OPT).
//!
//! # Modules
//!
//! - [`gaps`]: Gap distributions, their moments, and correlated gap processes
//! - [`statistics`]: Streaming mean/variance accumulators
//! - [`segmentation`]: The online feasible-region algorithm and stream segmenter
//! - [`simulation`]: Single-trajectory exit-time and segment-count simulation
//! - [`rng`]: Per-worker random streams
//!
//! # Usage
//!
//! ```
//! use plasim_core::{
//!     gaps::{Correlation, GapDistribution, GapSource},
//!     rng::stream_rng,
//!     simulation::ExitTimeSimulator,
//! };
//!
//! let gaps = GapSource::new(GapDistribution::Exponential { rate: 1.0 }).unwrap();
//! let sim = ExitTimeSimulator::new(gaps, Correlation::None).unwrap();
//! let result = sim.run(8.0, &mut stream_rng(42, 0)).unwrap();
//! assert!(result.opt_exit_time.is_some());
//! ```

pub mod constants;
pub mod error;
pub mod gaps;
pub mod rng;
pub mod segmentation;
pub mod simulation;
pub mod statistics;

pub use error::{Result, SimError};
pub use gaps::{Correlation, GapDistribution, GapModel, GapSource, Moments, Theory};
pub use segmentation::{Admission, FeasibleRegion, Segment, Segmenter};
pub use simulation::{Algorithm, ExitTime, ExitTimeSimulator, TrajectoryResult};
pub use statistics::RunningStat;
