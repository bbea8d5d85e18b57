//! Gap distributions and their theoretical moments.
//!
//! A gap is the non-negative increment between two consecutive keys of a
//! synthetic stream. Every distribution is validated once at construction and
//! is then shared read-only by all workers; sampling only advances the
//! caller-supplied random source.
//!
//! # Supported distributions
//!
//! | name        | parameters            | mean              | variance                     |
//! |-------------|-----------------------|-------------------|------------------------------|
//! | uniform     | min ≥ 0, max > min    | (min+max)/2       | (max−min)²/12                |
//! | pareto      | scale > 0, shape > 0  | shape·scale/(shape−1) | scale²·shape/((shape−1)²(shape−2)) |
//! | lognormal   | µ, σ > 0              | exp(µ+σ²/2)       | (exp(σ²)−1)·exp(2µ+σ²)       |
//! | exponential | rate λ > 0            | 1/λ               | 1/λ²                         |
//! | gamma       | shape k > 0, scale θ > 0 | kθ             | kθ²                          |
//!
//! Pareto moments that do not exist (shape ≤ 1 for the mean, shape ≤ 2 for the
//! variance) are reported as `+∞`.

mod process;

pub use process::{Correlation, GapProcess, Theory};

use crate::error::{Result, SimError};
use rand::distr::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma, LogNormal, Pareto};
use serde::Serialize;
use std::fmt;

/// Mean and variance of a gap distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
}

/// A gap distribution with known theoretical moments.
///
/// Implemented by [`GapSource`]; the simulator is generic over it so tests can
/// plug in deterministic gap sequences.
pub trait GapModel: Distribution<f64> + Sync {
    /// Theoretical mean and variance of a single draw.
    fn moments(&self) -> Moments;
}

/// Named gap distribution and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GapDistribution {
    /// Continuous uniform on `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// Pareto with minimum value `scale` and tail index `shape`.
    Pareto { scale: f64, shape: f64 },
    /// Lognormal with log-mean `mu` and log-deviation `sigma`.
    Lognormal { mu: f64, sigma: f64 },
    /// Exponential with rate `rate`.
    Exponential { rate: f64 },
    /// Gamma with shape `shape` and scale `scale`.
    Gamma { shape: f64, scale: f64 },
}

impl GapDistribution {
    /// Short lowercase name, as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            GapDistribution::Uniform { .. } => "uniform",
            GapDistribution::Pareto { .. } => "pareto",
            GapDistribution::Lognormal { .. } => "lognormal",
            GapDistribution::Exponential { .. } => "exponential",
            GapDistribution::Gamma { .. } => "gamma",
        }
    }

    /// Check every parameter against the distribution's domain.
    pub fn validate(&self) -> Result<()> {
        match *self {
            GapDistribution::Uniform { min, max } => {
                finite("min", min)?;
                finite("max", max)?;
                if min < 0.0 {
                    return Err(SimError::invalid("min", min, "gaps must be non-negative"));
                }
                if max <= min {
                    return Err(SimError::invalid("max", max, "must be greater than min"));
                }
            }
            GapDistribution::Pareto { scale, shape } => {
                positive("scale", scale)?;
                positive("shape", shape)?;
            }
            GapDistribution::Lognormal { mu, sigma } => {
                finite("mu", mu)?;
                positive("sigma", sigma)?;
            }
            GapDistribution::Exponential { rate } => positive("rate", rate)?,
            GapDistribution::Gamma { shape, scale } => {
                positive("shape", shape)?;
                positive("scale", scale)?;
            }
        }
        Ok(())
    }

    /// Theoretical moments of a single draw.
    pub fn moments(&self) -> Moments {
        match *self {
            GapDistribution::Uniform { min, max } => Moments {
                mean: (min + max) / 2.0,
                variance: (max - min).powi(2) / 12.0,
            },
            GapDistribution::Pareto { scale, shape } => Moments {
                mean: if shape > 1.0 {
                    shape * scale / (shape - 1.0)
                } else {
                    f64::INFINITY
                },
                variance: if shape > 2.0 {
                    scale * scale * shape / ((shape - 1.0).powi(2) * (shape - 2.0))
                } else {
                    f64::INFINITY
                },
            },
            GapDistribution::Lognormal { mu, sigma } => {
                let s2 = sigma * sigma;
                Moments {
                    mean: (mu + s2 / 2.0).exp(),
                    variance: (s2.exp() - 1.0) * (2.0 * mu + s2).exp(),
                }
            }
            GapDistribution::Exponential { rate } => Moments {
                mean: 1.0 / rate,
                variance: 1.0 / (rate * rate),
            },
            GapDistribution::Gamma { shape, scale } => Moments {
                mean: shape * scale,
                variance: shape * scale * scale,
            },
        }
    }
}

impl fmt::Display for GapDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GapDistribution::Uniform { min, max } => write!(f, "uniform(min={min}, max={max})"),
            GapDistribution::Pareto { scale, shape } => {
                write!(f, "pareto(scale={scale}, shape={shape})")
            }
            GapDistribution::Lognormal { mu, sigma } => {
                write!(f, "lognormal(mu={mu}, sigma={sigma})")
            }
            GapDistribution::Exponential { rate } => write!(f, "exponential(rate={rate})"),
            GapDistribution::Gamma { shape, scale } => {
                write!(f, "gamma(shape={shape}, scale={scale})")
            }
        }
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::invalid(name, value, "must be finite"))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(name, value, "must be positive"))
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    Uniform(Uniform<f64>),
    Pareto(Pareto<f64>),
    Lognormal(LogNormal<f64>),
    Exponential(Exp<f64>),
    Gamma(Gamma<f64>),
}

/// A validated gap distribution ready for sampling.
#[derive(Debug, Clone)]
pub struct GapSource {
    distribution: GapDistribution,
    sampler: Sampler,
}

impl GapSource {
    /// Validate `distribution` and build its sampler.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when a parameter is outside the distribution's domain.
    pub fn new(distribution: GapDistribution) -> Result<Self> {
        distribution.validate()?;
        let rejected = |name, value| SimError::invalid(name, value, "rejected by sampler");
        let sampler = match distribution {
            GapDistribution::Uniform { min, max } => {
                Sampler::Uniform(Uniform::new(min, max).map_err(|_| rejected("max", max))?)
            }
            GapDistribution::Pareto { scale, shape } => {
                Sampler::Pareto(Pareto::new(scale, shape).map_err(|_| rejected("shape", shape))?)
            }
            GapDistribution::Lognormal { mu, sigma } => Sampler::Lognormal(
                LogNormal::new(mu, sigma).map_err(|_| rejected("sigma", sigma))?,
            ),
            GapDistribution::Exponential { rate } => {
                Sampler::Exponential(Exp::new(rate).map_err(|_| rejected("rate", rate))?)
            }
            GapDistribution::Gamma { shape, scale } => {
                Sampler::Gamma(Gamma::new(shape, scale).map_err(|_| rejected("shape", shape))?)
            }
        };
        Ok(Self {
            distribution,
            sampler,
        })
    }

    /// The distribution this source samples from.
    pub fn distribution(&self) -> &GapDistribution {
        &self.distribution
    }
}

impl Distribution<f64> for GapSource {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.sampler {
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Pareto(d) => d.sample(rng),
            Sampler::Lognormal(d) => d.sample(rng),
            Sampler::Exponential(d) => d.sample(rng),
            Sampler::Gamma(d) => d.sample(rng),
        }
    }
}

impl GapModel for GapSource {
    fn moments(&self) -> Moments {
        self.distribution.moments()
    }
}

impl TryFrom<GapDistribution> for GapSource {
    type Error = SimError;

    fn try_from(distribution: GapDistribution) -> Result<Self> {
        Self::new(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::stream_rng;
    use crate::statistics::RunningStat;

    fn empirical(distribution: GapDistribution, n: usize) -> RunningStat {
        let source = GapSource::new(distribution).unwrap();
        let mut rng = stream_rng(11, 0);
        let mut stat = RunningStat::new();
        for _ in 0..n {
            stat.push(source.sample(&mut rng));
        }
        stat
    }

    #[test]
    fn test_uniform_moments() {
        let m = GapDistribution::Uniform { min: 0.0, max: 1.0 }.moments();
        assert!((m.mean - 0.5).abs() < 1e-12);
        assert!((m.variance - 1.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_pareto_heavy_tail_moments() {
        let m = GapDistribution::Pareto {
            scale: 1.0,
            shape: 1.5,
        }
        .moments();
        assert!((m.mean - 3.0).abs() < 1e-12);
        assert_eq!(m.variance, f64::INFINITY);

        let m = GapDistribution::Pareto {
            scale: 1.0,
            shape: 0.5,
        }
        .moments();
        assert_eq!(m.mean, f64::INFINITY);
    }

    #[test]
    fn test_lognormal_moments() {
        let m = GapDistribution::Lognormal {
            mu: 0.0,
            sigma: 1.0,
        }
        .moments();
        assert!((m.mean - 0.5f64.exp()).abs() < 1e-12);
        assert!((m.variance - (1f64.exp() - 1.0) * 1f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_and_exponential_moments() {
        let m = GapDistribution::Gamma {
            shape: 2.0,
            scale: 3.0,
        }
        .moments();
        assert_eq!(m.mean, 6.0);
        assert_eq!(m.variance, 18.0);

        let m = GapDistribution::Exponential { rate: 4.0 }.moments();
        assert_eq!(m.mean, 0.25);
        assert_eq!(m.variance, 0.0625);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let bad = [
            GapDistribution::Uniform { min: 1.0, max: 1.0 },
            GapDistribution::Uniform {
                min: -1.0,
                max: 1.0,
            },
            GapDistribution::Pareto {
                scale: 0.0,
                shape: 2.0,
            },
            GapDistribution::Lognormal {
                mu: 0.0,
                sigma: 0.0,
            },
            GapDistribution::Exponential { rate: -1.0 },
            GapDistribution::Exponential { rate: f64::NAN },
            GapDistribution::Gamma {
                shape: 1.0,
                scale: f64::INFINITY,
            },
        ];
        for d in bad {
            let err = GapSource::new(d).unwrap_err();
            assert!(
                matches!(err, SimError::InvalidParameter { .. }),
                "{d} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_samples_match_moments() {
        let d = GapDistribution::Gamma {
            shape: 2.0,
            scale: 0.5,
        };
        let stat = empirical(d, 200_000);
        let m = d.moments();
        assert!(
            (stat.mean() - m.mean).abs() < 0.01,
            "mean {} vs {}",
            stat.mean(),
            m.mean
        );
        assert!(
            (stat.variance() - m.variance).abs() < 0.02,
            "variance {} vs {}",
            stat.variance(),
            m.variance
        );
    }

    #[test]
    fn test_uniform_samples_in_range() {
        let source = GapSource::new(GapDistribution::Uniform { min: 2.0, max: 3.0 }).unwrap();
        let mut rng = stream_rng(1, 0);
        for _ in 0..10_000 {
            let g = source.sample(&mut rng);
            assert!((2.0..3.0).contains(&g));
        }
    }
}
