//! Latest-snapshot buffer for long Monte Carlo runs.
//!
//! Every few thousand trials the harness renders the full result table and
//! stores it here, together with a copy of the aggregate it was rendered
//! from. A dump request or an interrupt prints the stored rendering, so a run
//! that is killed halfway still yields usable, if partial, results.
//!
//! Snapshots are only written while the reducer lock is held, so each one
//! reflects a prefix of the completed trials. The last writer wins.

use crate::output::RunTotals;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// One stored checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<A> {
    /// Trials finished when the snapshot was taken.
    pub completed: u64,
    /// Rejected trials among `completed`.
    pub rejected: u64,
    pub aggregate: A,
    /// CSV rendering of `aggregate`.
    pub rendered: String,
}

impl<A> Snapshot<A> {
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            completed: self.completed,
            rejected: self.rejected,
        }
    }
}

/// Thread-safe holder of the most recent [`Snapshot`].
#[derive(Debug)]
pub struct CheckpointBuffer<A> {
    latest: Mutex<Option<Snapshot<A>>>,
}

impl<A> Default for CheckpointBuffer<A> {
    fn default() -> Self {
        Self {
            latest: Mutex::new(None),
        }
    }
}

impl<A: Clone> CheckpointBuffer<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot.
    pub fn store(&self, snapshot: Snapshot<A>) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Copy of the latest snapshot, if any was taken.
    pub fn latest(&self) -> Option<Snapshot<A>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Trials covered by the latest snapshot, 0 if none.
    pub fn completed(&self) -> u64 {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |s| s.completed)
    }

    /// Write the trial counts and latest rendering to `out`.
    ///
    /// Returns `false` when no snapshot has been taken yet.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<bool> {
        let guard = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(snapshot) => {
                out.write_all(snapshot.totals().preamble().render().as_bytes())?;
                out.write_all(snapshot.rendered.as_bytes())?;
                out.flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
