//! Correlated gap processes built on top of an i.i.d. gap distribution.

use super::{GapModel, Moments};
use crate::error::{Result, SimError};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Correlation structure applied to raw gap draws.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correlation {
    /// Independent draws.
    #[default]
    None,
    /// Each increment is the sum of the last `order` raw draws.
    ///
    /// An order of 0 behaves as order 1.
    MovingAverage { order: usize },
    /// `gap[t] = phi * gap[t-1] + noise[t]`, starting from `gap[0] = 0`.
    Autoregressive { phi: f64 },
}

impl Correlation {
    /// Autoregressive process of order one, validating `|phi| < 1`.
    pub fn autoregressive(phi: f64) -> Result<Self> {
        let c = Correlation::Autoregressive { phi };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<()> {
        if let Correlation::Autoregressive { phi } = *self {
            if !phi.is_finite() || phi.abs() >= 1.0 {
                return Err(SimError::invalid(
                    "phi",
                    phi,
                    "autoregressive coefficient must satisfy |phi| < 1",
                ));
            }
        }
        Ok(())
    }

    /// Length of the moving window; 1 for non-moving-average processes.
    pub fn window(&self) -> usize {
        match *self {
            Correlation::MovingAverage { order } => order.max(1),
            _ => 1,
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Correlation::None => write!(f, "moving-average process order 1"),
            Correlation::MovingAverage { .. } => {
                write!(f, "moving-average process order {}", self.window())
            }
            Correlation::Autoregressive { phi } => write!(f, "autoregressive process phi {phi}"),
        }
    }
}

/// Theoretical quantities of a gap process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Theory {
    /// Mean of a single gap (stationary mean for AR(1)).
    pub mean: f64,
    /// Variance of a single gap (stationary variance for AR(1)).
    pub variance: f64,
    /// Constant governing the expected MET segment length: `mean² / variance`,
    /// scaled by `(1 - phi) / (1 + phi)` for AR(1).
    pub met_constant: f64,
    /// Slope of the fixed MET line, i.e. the reciprocal of the expected
    /// increment per step.
    pub slope: f64,
}

impl Theory {
    pub fn new(moments: Moments, correlation: &Correlation) -> Result<Self> {
        correlation.validate()?;
        let Moments { mean, variance } = moments;
        Ok(match *correlation {
            Correlation::Autoregressive { phi } => {
                let mean = mean / (1.0 - phi);
                let variance = variance / (1.0 - phi * phi);
                Theory {
                    mean,
                    variance,
                    met_constant: ((1.0 - phi) / (1.0 + phi)) * mean * mean / variance,
                    slope: 1.0 / mean,
                }
            }
            _ => Theory {
                mean,
                variance,
                met_constant: mean * mean / variance,
                slope: 1.0 / (mean * correlation.window() as f64),
            },
        })
    }
}

#[derive(Debug, Clone)]
enum State {
    MovingSum {
        window: Vec<f64>,
        cursor: usize,
        sum: f64,
    },
    Autoregressive {
        phi: f64,
        prev: f64,
    },
}

/// Stateful stream of increments for one trajectory.
///
/// The moving-average window is prefilled with `order` draws before the first
/// increment is produced.
#[derive(Debug, Clone)]
pub struct GapProcess<'a, D> {
    gaps: &'a D,
    state: State,
}

impl<'a, D: GapModel> GapProcess<'a, D> {
    pub fn new<R: Rng + ?Sized>(gaps: &'a D, correlation: &Correlation, rng: &mut R) -> Self {
        let state = match *correlation {
            Correlation::Autoregressive { phi } => State::Autoregressive { phi, prev: 0.0 },
            _ => {
                let window: Vec<f64> = (0..correlation.window()).map(|_| gaps.sample(rng)).collect();
                let sum = window.iter().sum();
                State::MovingSum {
                    window,
                    cursor: 0,
                    sum,
                }
            }
        };
        Self { gaps, state }
    }

    /// Draw the next increment of the cumulative key.
    #[inline]
    pub fn next_increment<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let gap = self.gaps.sample(rng);
        match &mut self.state {
            State::MovingSum {
                window,
                cursor,
                sum,
            } => {
                *sum += gap - window[*cursor];
                window[*cursor] = gap;
                *cursor += 1;
                if *cursor == window.len() {
                    *cursor = 0;
                }
                *sum
            }
            State::Autoregressive { phi, prev } => {
                *prev = *phi * *prev + gap;
                *prev
            }
        }
    }
}
