//! Error type for experiment configuration and execution.

use plasim_core::SimError;
use std::path::PathBuf;

/// Errors raised while configuring or running an experiment.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The experiment configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A distribution or correlation parameter was rejected.
    #[error(transparent)]
    Simulation(#[from] SimError),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset file could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Dataset {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Result alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
