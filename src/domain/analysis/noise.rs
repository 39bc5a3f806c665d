//! Noise Model - Log-space perturbation for Monte Carlo draws.
//!
//! Judgments and scores are ratio-scaled, so noise is drawn around 0 in log
//! space and applied multiplicatively: `value · exp(ε)`. The half-width of
//! the noise is `spread = ln(1 + uncertainty_level)`.

use rand::Rng;
use rand_distr::{Beta, Distribution, Normal, Triangular, Uniform};
use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// Shape of the log-space noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseDistribution {
    /// Uniform on `[−spread, spread]`.
    Uniform,
    /// Normal with `σ = spread / 2`, so ±spread covers about 95% of draws.
    #[default]
    Normal,
    /// Symmetric triangular on `[−spread, spread]` peaking at 0.
    Triangular,
    /// Beta(2, 2) mapped onto `[−spread, spread]`.
    Beta,
}

impl std::fmt::Display for NoiseDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NoiseDistribution::Uniform => "uniform",
            NoiseDistribution::Normal => "normal",
            NoiseDistribution::Triangular => "triangular",
            NoiseDistribution::Beta => "beta",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for NoiseDistribution {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(NoiseDistribution::Uniform),
            "normal" => Ok(NoiseDistribution::Normal),
            "triangular" => Ok(NoiseDistribution::Triangular),
            "beta" => Ok(NoiseDistribution::Beta),
            other => Err(AnalysisError::invalid_parameter(
                "distribution",
                format!(
                    "unknown distribution '{}', expected uniform|normal|triangular|beta",
                    other
                ),
            )),
        }
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Triangular(Triangular<f64>),
    Beta(Beta<f64>),
}

/// A prepared noise source for one simulation run.
#[derive(Debug, Clone)]
pub struct LogNoise {
    spread: f64,
    sampler: Sampler,
}

impl LogNoise {
    /// Prepares the sampler for `distribution` at the given uncertainty.
    pub fn new(distribution: NoiseDistribution, uncertainty_level: f64) -> Result<Self, AnalysisError> {
        if !uncertainty_level.is_finite() || uncertainty_level < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "uncertainty_level",
                format!("must be non-negative, got {}", uncertainty_level),
            ));
        }
        let spread = (1.0 + uncertainty_level).ln();
        let invalid = |e: String| AnalysisError::invalid_parameter("distribution", e);

        let sampler = match distribution {
            NoiseDistribution::Uniform => Sampler::Uniform(Uniform::new_inclusive(-spread, spread)),
            NoiseDistribution::Normal => Sampler::Normal(
                Normal::new(0.0, spread / 2.0).map_err(|e| invalid(e.to_string()))?,
            ),
            NoiseDistribution::Triangular => Sampler::Triangular(
                Triangular::new(-spread, spread, 0.0).map_err(|e| invalid(e.to_string()))?,
            ),
            NoiseDistribution::Beta => {
                Sampler::Beta(Beta::new(2.0, 2.0).map_err(|e| invalid(e.to_string()))?)
            }
        };

        Ok(Self { spread, sampler })
    }

    /// Half-width of the noise in log space.
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Draws one log-space offset.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.sampler {
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Normal(d) => d.sample(rng),
            Sampler::Triangular(d) => d.sample(rng),
            Sampler::Beta(d) => self.spread * (2.0 * d.sample(rng) - 1.0),
        }
    }

    /// Returns `value · exp(ε)` for a fresh draw ε.
    pub fn perturb<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        value * self.sample(rng).exp()
    }
}
