//! Priority Engine - Priority vectors and consistency metrics from comparison matrices.

use serde::{Deserialize, Serialize};

use super::ComparisonMatrix;

/// Saaty's Random Index for matrix sizes 1 through 15.
pub const RANDOM_INDEX: [f64; 15] = [
    0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

/// Matrices with a consistency ratio at or below this value are acceptable.
pub const CONSISTENCY_THRESHOLD: f64 = 0.1;

/// Maximum power-iteration steps.
pub const MAX_POWER_ITERATIONS: usize = 100;

/// Power iteration stops once no component moves more than this.
pub const POWER_ITERATION_TOLERANCE: f64 = 1e-10;

/// Returns the Random Index for a matrix of size `n`.
///
/// Sizes above the table reuse its last entry.
pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n if n <= RANDOM_INDEX.len() => RANDOM_INDEX[n - 1],
        _ => RANDOM_INDEX[RANDOM_INDEX.len() - 1],
    }
}

/// Consistency measures for a comparison matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    /// Principal eigenvalue estimate.
    pub lambda_max: f64,
    /// Consistency Index: (λmax − n) / (n − 1).
    pub ci: f64,
    /// Consistency Ratio: CI / RI[n]; zero for n ≤ 2.
    pub cr: f64,
    pub is_consistent: bool,
}

impl ConsistencyMetrics {
    /// Metrics of a trivially consistent matrix.
    pub fn perfect(n: usize) -> Self {
        Self {
            lambda_max: n as f64,
            ci: 0.0,
            cr: 0.0,
            is_consistent: true,
        }
    }

    /// Computes CI, CR and the consistency verdict for a given λmax.
    pub fn from_lambda_max(lambda_max: f64, n: usize) -> Self {
        let ci = if n > 1 {
            (lambda_max - n as f64) / (n as f64 - 1.0)
        } else {
            0.0
        };
        let ri = random_index(n);
        let cr = if n <= 2 || ri == 0.0 { 0.0 } else { ci / ri };

        Self {
            lambda_max,
            ci,
            cr,
            is_consistent: cr <= CONSISTENCY_THRESHOLD,
        }
    }
}

/// Normalized weight vector derived from a comparison matrix.
///
/// Entries are non-negative and sum to 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityVector(Vec<f64>);

impl PriorityVector {
    /// Normalizes raw non-negative values so they sum to 1.
    ///
    /// A zero or non-finite total falls back to the uniform vector.
    pub fn normalized(values: Vec<f64>) -> Self {
        let total: f64 = values.iter().sum();
        if values.is_empty() {
            return Self(values);
        }
        if total <= 0.0 || !total.is_finite() {
            let n = values.len();
            return Self::uniform(n);
        }
        Self(values.into_iter().map(|v| v / total).collect())
    }

    /// The vector giving every element weight 1/n.
    pub fn uniform(n: usize) -> Self {
        Self(vec![1.0 / n as f64; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Output of [`PriorityEngine::derive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityResult {
    pub priorities: PriorityVector,
    pub consistency: ConsistencyMetrics,
    /// Power-iteration steps performed.
    pub iterations: usize,
    /// Whether the iteration met its tolerance before the step cap.
    pub converged: bool,
}

/// Derives priorities by power iteration on the principal eigenvector.
pub struct PriorityEngine;

impl PriorityEngine {
    /// Derives the priority vector and consistency metrics of a matrix.
    ///
    /// # Algorithm
    /// Start from the uniform vector and repeat `v' = M·v / Σ(M·v)` until the
    /// largest component change drops below 1e-10 (at most 100 steps).
    /// λmax is the mean of `(M·v)_i / v_i`.
    ///
    /// # Edge Cases
    /// - Empty matrix: empty priorities, CR = 0, consistent
    /// - 1×1 matrix: priority [1], CI = 0
    pub fn derive(matrix: &ComparisonMatrix) -> PriorityResult {
        let n = matrix.size();
        if n == 0 {
            return PriorityResult {
                priorities: PriorityVector::default(),
                consistency: ConsistencyMetrics::perfect(0),
                iterations: 0,
                converged: true,
            };
        }

        let mut current = vec![1.0 / n as f64; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < MAX_POWER_ITERATIONS {
            iterations += 1;
            let next = PriorityVector::normalized(matrix.multiply(&current)).into_inner();
            let max_change = next
                .iter()
                .zip(&current)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            current = next;

            if max_change < POWER_ITERATION_TOLERANCE {
                converged = true;
                break;
            }
        }

        let lambda_max = Self::lambda_max(matrix, &current);

        PriorityResult {
            priorities: PriorityVector(current),
            consistency: ConsistencyMetrics::from_lambda_max(lambda_max, n),
            iterations,
            converged,
        }
    }

    /// Estimates λmax as the mean of `(M·v)_i / v_i` over components with `v_i > 0`.
    pub fn lambda_max(matrix: &ComparisonMatrix, priorities: &[f64]) -> f64 {
        let weighted = matrix.multiply(priorities);
        let ratios: Vec<f64> = weighted
            .iter()
            .zip(priorities)
            .filter(|(_, p)| **p > 0.0)
            .map(|(w, p)| w / p)
            .collect();

        if ratios.is_empty() {
            return 0.0;
        }
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}
