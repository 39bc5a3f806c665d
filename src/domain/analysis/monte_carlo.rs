//! Monte Carlo Simulator - Ranking stability under judgment and score noise.
//!
//! Each iteration perturbs the criteria comparison matrix and every
//! criterion's alternative scores with log-space noise, re-derives the
//! criteria weights, and records the resulting totals and rank order.
//! Draws whose perturbed matrix is too inconsistent are discarded and
//! counted, never treated as errors.
//!
//! Iterations share one RNG stream so a seeded run is reproducible.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::comparison_matrix::{SAATY_MAX, SAATY_MIN};
use super::group_consensus::population_std;
use super::weights::{ranking, top_index, weighted_totals};
use super::{
    AnalysisError, ComparisonMatrix, LogNoise, NoiseDistribution, PriorityEngine, PriorityVector,
    ScoreTable,
};

pub const MIN_ITERATIONS: usize = 1_000;
pub const MAX_ITERATIONS: usize = 50_000;
pub const MAX_UNCERTAINTY_LEVEL: f64 = 0.30;

/// Running means are compared every this many valid iterations.
pub const CHECKPOINT_INTERVAL: usize = 500;

/// Checkpoints start once this many valid iterations have accumulated.
pub const CHECKPOINT_WARMUP: usize = 1_000;

/// Early stopping is never allowed below this many valid iterations.
pub const MIN_ITERATIONS_FOR_CONVERGENCE: usize = 2_000;

/// Perturbed scores are floored here before renormalization.
pub const SCORE_FLOOR: f64 = 0.001;

fn default_iterations() -> usize {
    10_000
}

fn default_uncertainty_level() -> f64 {
    0.1
}

fn default_convergence_tolerance() -> f64 {
    0.001
}

fn default_cr_threshold() -> f64 {
    0.1
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Upper bound on attempted iterations.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    #[serde(default = "default_uncertainty_level")]
    pub uncertainty_level: f64,

    #[serde(default)]
    pub distribution: NoiseDistribution,

    #[serde(default = "default_convergence_tolerance")]
    pub convergence_tolerance: f64,

    /// Perturbed matrices with a CR above this are discarded.
    #[serde(default = "default_cr_threshold")]
    pub cr_threshold: f64,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Wall-clock budget in milliseconds.
    #[serde(default)]
    pub max_duration_ms: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            uncertainty_level: default_uncertainty_level(),
            distribution: NoiseDistribution::default(),
            convergence_tolerance: default_convergence_tolerance(),
            cr_threshold: default_cr_threshold(),
            seed: None,
            max_duration_ms: None,
        }
    }
}

impl MonteCarloConfig {
    /// Sets a seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }

    /// Checks every setting is inside its valid range.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(AnalysisError::invalid_parameter(
                "iterations",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_ITERATIONS, MAX_ITERATIONS, self.iterations
                ),
            ));
        }
        if !self.uncertainty_level.is_finite()
            || self.uncertainty_level < 0.0
            || self.uncertainty_level > MAX_UNCERTAINTY_LEVEL
        {
            return Err(AnalysisError::invalid_parameter(
                "uncertainty_level",
                format!(
                    "must be between 0 and {}, got {}",
                    MAX_UNCERTAINTY_LEVEL, self.uncertainty_level
                ),
            ));
        }
        if !self.convergence_tolerance.is_finite() || self.convergence_tolerance <= 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "convergence_tolerance",
                format!("must be positive, got {}", self.convergence_tolerance),
            ));
        }
        if !self.cr_threshold.is_finite() || self.cr_threshold < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "cr_threshold",
                format!("must be non-negative, got {}", self.cr_threshold),
            ));
        }
        Ok(())
    }
}

/// Score distribution of one alternative over the valid iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeStatistics {
    pub alternative_id: String,
    pub mean_score: f64,
    pub std_dev: f64,
    /// 2.5th percentile of the recorded scores.
    pub ci_lower: f64,
    /// 97.5th percentile of the recorded scores.
    pub ci_upper: f64,
    /// `rank_probabilities[r]` is the fraction of iterations at rank `r + 1`.
    pub rank_probabilities: Vec<f64>,
    /// Mean 1-based rank.
    pub mean_rank: f64,
}

impl AlternativeStatistics {
    /// Probability of being ranked first.
    pub fn first_rank_probability(&self) -> f64 {
        self.rank_probabilities.first().copied().unwrap_or(0.0)
    }
}

/// Weight distribution of one criterion over the valid iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStatistics {
    pub criterion_id: String,
    pub mean_weight: f64,
    pub std_dev: f64,
    /// `std_dev / mean_weight`; 0 when the mean is 0.
    pub coefficient_of_variation: f64,
}

/// Why the simulation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every configured iteration was attempted.
    Completed,
    /// Running means stabilized below the convergence tolerance.
    Converged,
    /// The wall-clock budget ran out first.
    TimeBudgetExhausted,
}

/// Aggregated simulation statistics.
///
/// `valid_iterations == 0` is a legitimate outcome: statistics are then
/// empty or zero and there is no dominant alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub alternatives: Vec<AlternativeStatistics>,
    pub criteria: Vec<CriterionStatistics>,
    pub valid_iterations: usize,
    pub attempted_iterations: usize,
    pub discarded_iterations: usize,
    pub converged: bool,
    pub termination: Termination,
    /// Alternative with the highest probability of rank 1.
    pub dominant_alternative: Option<String>,
    /// Rank-1 probability of the dominant alternative.
    pub rank_stability: f64,
}

impl MonteCarloResult {
    pub fn alternative(&self, id: &str) -> Option<&AlternativeStatistics> {
        self.alternatives.iter().find(|a| a.alternative_id == id)
    }

    pub fn criterion(&self, id: &str) -> Option<&CriterionStatistics> {
        self.criteria.iter().find(|c| c.criterion_id == id)
    }
}

/// Per-iteration samples gathered by the loop.
struct Samples {
    scores: Vec<Vec<f64>>,
    weights: Vec<Vec<f64>>,
    rank_counts: Vec<Vec<usize>>,
    running_totals: Vec<f64>,
    valid: usize,
}

impl Samples {
    fn new(criteria: usize, alternatives: usize) -> Self {
        Self {
            scores: vec![Vec::new(); alternatives],
            weights: vec![Vec::new(); criteria],
            rank_counts: vec![vec![0; alternatives]; alternatives],
            running_totals: vec![0.0; alternatives],
            valid: 0,
        }
    }

    fn record(&mut self, weights: &[f64], totals: &[f64]) {
        for (samples, weight) in self.weights.iter_mut().zip(weights) {
            samples.push(*weight);
        }
        for (alternative, total) in totals.iter().enumerate() {
            self.scores[alternative].push(*total);
            self.running_totals[alternative] += total;
        }
        for (position, alternative) in ranking(totals).into_iter().enumerate() {
            self.rank_counts[alternative][position] += 1;
        }
        self.valid += 1;
    }

    fn running_means(&self) -> Vec<f64> {
        let n = self.valid.max(1) as f64;
        self.running_totals.iter().map(|t| t / n).collect()
    }
}

/// Monte Carlo robustness simulation.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Runs the simulation with the configured seed, or OS entropy if unset.
    ///
    /// # Errors
    /// - `InvalidParameter` for an out-of-range config
    /// - `InvalidMatrix` if `matrix` is empty or does not match the table's criteria
    pub fn run(
        &self,
        matrix: &ComparisonMatrix,
        scores: &ScoreTable,
    ) -> Result<MonteCarloResult, AnalysisError> {
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.run_with_rng(matrix, scores, &mut rng)
    }

    /// Runs the simulation drawing from a caller-supplied RNG.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        matrix: &ComparisonMatrix,
        scores: &ScoreTable,
        rng: &mut R,
    ) -> Result<MonteCarloResult, AnalysisError> {
        self.config.validate()?;
        matrix.require_non_empty()?;
        if matrix.size() != scores.criterion_count() {
            return Err(AnalysisError::invalid_matrix(format!(
                "criteria matrix is {}x{} but the score table has {} criteria",
                matrix.size(),
                matrix.size(),
                scores.criterion_count()
            )));
        }

        let noise = LogNoise::new(self.config.distribution, self.config.uncertainty_level)?;
        let budget = self.config.max_duration();
        let started = Instant::now();

        let mut samples = Samples::new(scores.criterion_count(), scores.alternative_count());
        let mut attempted = 0;
        let mut discarded = 0;
        let mut checkpoint: Option<Vec<f64>> = None;
        let mut termination = Termination::Completed;

        while attempted < self.config.iterations {
            if budget.is_some_and(|limit| started.elapsed() >= limit) {
                termination = Termination::TimeBudgetExhausted;
                break;
            }
            attempted += 1;

            let perturbed = perturb_matrix(matrix, &noise, rng);
            let derived = PriorityEngine::derive(&perturbed);
            if derived.consistency.cr > self.config.cr_threshold {
                discarded += 1;
                continue;
            }

            let rows: Vec<Vec<f64>> = scores
                .rows()
                .iter()
                .map(|row| perturb_scores(row, &noise, rng))
                .collect();
            let weights = derived.priorities.values();
            let totals = weighted_totals(weights, &rows, scores.alternative_count());
            samples.record(weights, &totals);

            if samples.valid >= CHECKPOINT_WARMUP && samples.valid % CHECKPOINT_INTERVAL == 0 {
                let means = samples.running_means();
                if let Some(previous) = &checkpoint {
                    let max_change = means
                        .iter()
                        .zip(previous)
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max);
                    debug!(
                        valid_iterations = samples.valid,
                        max_change, "Monte Carlo checkpoint"
                    );
                    if max_change < self.config.convergence_tolerance
                        && samples.valid >= MIN_ITERATIONS_FOR_CONVERGENCE
                    {
                        termination = Termination::Converged;
                        break;
                    }
                }
                checkpoint = Some(means);
            }
        }

        debug!(
            attempted,
            valid = samples.valid,
            discarded,
            ?termination,
            "Monte Carlo simulation finished"
        );

        Ok(summarize(scores, samples, attempted, discarded, termination))
    }
}

/// Perturbs every upper-triangular cell and mirrors its reciprocal.
fn perturb_matrix<R: Rng + ?Sized>(
    matrix: &ComparisonMatrix,
    noise: &LogNoise,
    rng: &mut R,
) -> ComparisonMatrix {
    let n = matrix.size();
    let mut upper = vec![1.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            upper[i * n + j] = noise.perturb(matrix[(i, j)], rng).clamp(SAATY_MIN, SAATY_MAX);
        }
    }
    ComparisonMatrix::from_fn(n, |i, j| match i.cmp(&j) {
        std::cmp::Ordering::Equal => 1.0,
        std::cmp::Ordering::Less => upper[i * n + j],
        std::cmp::Ordering::Greater => 1.0 / upper[j * n + i],
    })
}

fn perturb_scores<R: Rng + ?Sized>(row: &[f64], noise: &LogNoise, rng: &mut R) -> Vec<f64> {
    let perturbed = row
        .iter()
        .map(|score| noise.perturb(*score, rng).max(SCORE_FLOOR))
        .collect();
    PriorityVector::normalized(perturbed).into_inner()
}

/// Value at the given fraction of a sorted sample.
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * fraction) as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn summarize(
    scores: &ScoreTable,
    samples: Samples,
    attempted: usize,
    discarded: usize,
    termination: Termination,
) -> MonteCarloResult {
    let valid = samples.valid;

    let alternatives: Vec<AlternativeStatistics> = if valid == 0 {
        Vec::new()
    } else {
        scores
            .alternatives()
            .iter()
            .zip(samples.scores)
            .zip(&samples.rank_counts)
            .map(|((id, mut recorded), counts)| {
                let mean_score = mean(&recorded);
                let std_dev = population_std(recorded.iter().copied());
                recorded.sort_by(f64::total_cmp);

                let rank_probabilities: Vec<f64> =
                    counts.iter().map(|c| *c as f64 / valid as f64).collect();
                let mean_rank = rank_probabilities
                    .iter()
                    .enumerate()
                    .map(|(r, p)| (r + 1) as f64 * p)
                    .sum();

                AlternativeStatistics {
                    alternative_id: id.clone(),
                    mean_score,
                    std_dev,
                    ci_lower: percentile(&recorded, 0.025),
                    ci_upper: percentile(&recorded, 0.975),
                    rank_probabilities,
                    mean_rank,
                }
            })
            .collect()
    };

    let criteria = if valid == 0 {
        Vec::new()
    } else {
        scores
            .criteria()
            .iter()
            .zip(&samples.weights)
            .map(|(id, recorded)| {
                let mean_weight = mean(recorded);
                let std_dev = population_std(recorded.iter().copied());
                CriterionStatistics {
                    criterion_id: id.clone(),
                    mean_weight,
                    std_dev,
                    coefficient_of_variation: if mean_weight == 0.0 {
                        0.0
                    } else {
                        std_dev / mean_weight
                    },
                }
            })
            .collect()
    };

    let first_rank: Vec<f64> = alternatives
        .iter()
        .map(AlternativeStatistics::first_rank_probability)
        .collect();
    let dominant_index = top_index(&first_rank);

    MonteCarloResult {
        dominant_alternative: dominant_index.map(|i| alternatives[i].alternative_id.clone()),
        rank_stability: dominant_index.map(|i| first_rank[i]).unwrap_or(0.0),
        alternatives,
        criteria,
        valid_iterations: valid,
        attempted_iterations: attempted,
        discarded_iterations: discarded,
        converged: termination == Termination::Converged,
        termination,
    }
}
