//! Streaming statistics.

mod running;

pub use running::{RunningStat, StatSummary};
