//! Group Consensus - Aggregating several evaluators into one result.
//!
//! Four interchangeable strategies, chosen explicitly by the caller:
//!
//! - AIJ: aggregate individual judgments (geometric-mean matrix, then derive)
//! - AIP: aggregate individual priorities (derive each, then geometric-mean)
//! - Fuzzy: triangular fuzzy numbers with centroid defuzzification
//! - Entropy: Shannon-entropy agreement diagnostics per criterion

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    AnalysisError, ComparisonMatrix, ConsistencyMetrics, EntropyConsensus,
    EntropyConsensusResult, FuzzyConsensus, FuzzyConsensusResult, PriorityEngine,
    PriorityVector, WeightMap,
};

/// One evaluator's complete comparison matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorJudgment {
    pub id: String,
    pub matrix: ComparisonMatrix,
    /// Relative importance of this evaluator; evaluators without one count as 1.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl EvaluatorJudgment {
    /// Creates an evaluator judgment with default weight.
    pub fn new(id: impl Into<String>, matrix: ComparisonMatrix) -> Self {
        Self {
            id: id.into(),
            matrix,
            weight: None,
        }
    }

    /// Creates an evaluator judgment with an explicit weight.
    pub fn with_weight(id: impl Into<String>, matrix: ComparisonMatrix, weight: f64) -> Self {
        Self {
            id: id.into(),
            matrix,
            weight: Some(weight),
        }
    }
}

/// Priorities and consistency derived from a single evaluator's matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualResult {
    pub evaluator_id: String,
    pub priorities: WeightMap,
    pub consistency: ConsistencyMetrics,
}

/// Result of aggregating individual judgments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AijResult {
    pub aggregated_matrix: ComparisonMatrix,
    pub priorities: WeightMap,
    pub consistency: ConsistencyMetrics,
    pub individual: Vec<IndividualResult>,
}

/// Result of aggregating individual priorities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AipResult {
    pub priorities: WeightMap,
    /// Population standard deviation of each criterion's weight across evaluators.
    pub dispersion: WeightMap,
    pub individual: Vec<IndividualResult>,
}

/// Aggregation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    #[default]
    Aij,
    Aip,
    Fuzzy,
    Entropy,
}

/// Output of [`GroupConsensus::aggregate`], tagged by strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum GroupConsensusResult {
    Aij(AijResult),
    Aip(AipResult),
    Fuzzy(FuzzyConsensusResult),
    Entropy(EntropyConsensusResult),
}

impl GroupConsensusResult {
    /// Consensus criteria weights, if the strategy produces them.
    pub fn consensus_weights(&self) -> Option<&WeightMap> {
        match self {
            GroupConsensusResult::Aij(r) => Some(&r.priorities),
            GroupConsensusResult::Aip(r) => Some(&r.priorities),
            GroupConsensusResult::Fuzzy(r) => Some(&r.priorities),
            GroupConsensusResult::Entropy(_) => None,
        }
    }

    /// Per-evaluator results, where the strategy derives them.
    pub fn individual(&self) -> &[IndividualResult] {
        match self {
            GroupConsensusResult::Aij(r) => &r.individual,
            GroupConsensusResult::Aip(r) => &r.individual,
            GroupConsensusResult::Fuzzy(_) => &[],
            GroupConsensusResult::Entropy(r) => &r.individual,
        }
    }
}

/// Group aggregation over a fixed, ordered criteria set.
#[derive(Debug, Clone)]
pub struct GroupConsensus {
    criteria: Vec<String>,
}

impl GroupConsensus {
    /// Creates an aggregator for the given criteria order.
    pub fn new(criteria: Vec<impl Into<String>>) -> Self {
        Self {
            criteria: criteria.into_iter().map(Into::into).collect(),
        }
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    /// Runs the selected strategy.
    pub fn aggregate(
        &self,
        strategy: AggregationStrategy,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<GroupConsensusResult, AnalysisError> {
        Ok(match strategy {
            AggregationStrategy::Aij => {
                GroupConsensusResult::Aij(self.aggregate_judgments(evaluators)?)
            }
            AggregationStrategy::Aip => {
                GroupConsensusResult::Aip(self.aggregate_priorities(evaluators)?)
            }
            AggregationStrategy::Fuzzy => {
                GroupConsensusResult::Fuzzy(self.fuzzy_consensus(evaluators)?)
            }
            AggregationStrategy::Entropy => {
                GroupConsensusResult::Entropy(self.entropy_consensus(evaluators)?)
            }
        })
    }

    /// AIJ: weighted geometric mean of the matrices, then one derivation.
    ///
    /// `agg[i][j] = Π m_e[i][j]^(w_e / Σw)`
    pub fn aggregate_judgments(
        &self,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<AijResult, AnalysisError> {
        let weights = self.validate(evaluators)?;
        let aggregated_matrix = Self::geometric_mean_matrix(evaluators, &weights)?;
        let derived = PriorityEngine::derive(&aggregated_matrix);

        Ok(AijResult {
            priorities: WeightMap::from_priorities(&self.criteria, &derived.priorities)?,
            consistency: derived.consistency,
            aggregated_matrix,
            individual: self.individual_results(evaluators)?,
        })
    }

    /// AIP: derive each evaluator, then weighted geometric mean of the vectors.
    pub fn aggregate_priorities(
        &self,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<AipResult, AnalysisError> {
        let weights = self.validate(evaluators)?;
        let individual = self.individual_results(evaluators)?;
        let vectors: Vec<Vec<f64>> = individual.iter().map(|r| r.priorities.values()).collect();

        let n = self.criteria.len();
        let combined: Vec<f64> = (0..n)
            .map(|i| {
                let log_sum: f64 = vectors
                    .iter()
                    .zip(&weights)
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(v, w)| w * v[i].ln())
                    .sum();
                log_sum.exp()
            })
            .collect();
        let priorities = PriorityVector::normalized(combined);

        let dispersion: Vec<f64> = (0..n)
            .map(|i| population_std(vectors.iter().map(|v| v[i])))
            .collect();

        Ok(AipResult {
            priorities: WeightMap::from_priorities(&self.criteria, &priorities)?,
            dispersion: WeightMap::new(&self.criteria, &dispersion)?,
            individual,
        })
    }

    /// Fuzzy consensus over triangular fuzzy numbers.
    pub fn fuzzy_consensus(
        &self,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<FuzzyConsensusResult, AnalysisError> {
        let weights = self.validate(evaluators)?;
        FuzzyConsensus::compute(&self.criteria, evaluators, &weights)
    }

    /// Shannon-entropy consensus with pairwise agreement and outlier detection.
    pub fn entropy_consensus(
        &self,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<EntropyConsensusResult, AnalysisError> {
        self.validate(evaluators)?;
        let individual = self.individual_results(evaluators)?;
        EntropyConsensus::compute(&self.criteria, individual)
    }

    /// Derives every evaluator's priorities independently, in evaluator order.
    pub fn individual_results(
        &self,
        evaluators: &[EvaluatorJudgment],
    ) -> Result<Vec<IndividualResult>, AnalysisError> {
        evaluators
            .par_iter()
            .map(|evaluator| {
                let derived = PriorityEngine::derive(&evaluator.matrix);
                Ok(IndividualResult {
                    evaluator_id: evaluator.id.clone(),
                    priorities: WeightMap::from_priorities(&self.criteria, &derived.priorities)?,
                    consistency: derived.consistency,
                })
            })
            .collect()
    }

    /// Element-wise weighted geometric mean of the evaluator matrices.
    ///
    /// `weights` must already be normalized to sum to 1.
    ///
    /// # Errors
    /// `InvalidMatrix` if the matrices differ in size or `weights` is not
    /// aligned with `evaluators`.
    pub fn geometric_mean_matrix(
        evaluators: &[EvaluatorJudgment],
        weights: &[f64],
    ) -> Result<ComparisonMatrix, AnalysisError> {
        let n = evaluators.first().map(|e| e.matrix.size()).unwrap_or(0);
        ensure_aligned(evaluators, n, weights)?;

        Ok(ComparisonMatrix::from_fn(n, |i, j| {
            if i == j {
                return 1.0;
            }
            evaluators
                .iter()
                .zip(weights)
                .filter(|(_, w)| **w > 0.0)
                .map(|(e, w)| w * e.matrix[(i, j)].ln())
                .sum::<f64>()
                .exp()
        }))
    }

    /// Checks the evaluator set and returns normalized evaluator weights.
    pub fn validate(&self, evaluators: &[EvaluatorJudgment]) -> Result<Vec<f64>, AnalysisError> {
        if evaluators.is_empty() {
            return Err(AnalysisError::NoEvaluators);
        }
        if self.criteria.is_empty() {
            return Err(AnalysisError::invalid_matrix(
                "matrix size must be positive",
            ));
        }

        ensure_sizes(evaluators, self.criteria.len())?;
        for evaluator in evaluators {
            if let Some(weight) = evaluator.weight {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(AnalysisError::invalid_parameter(
                        "evaluator_weight",
                        format!("evaluator '{}' has weight {}", evaluator.id, weight),
                    ));
                }
            }
        }

        Ok(normalized_evaluator_weights(evaluators))
    }
}

/// Every evaluator matrix must be `n`×`n`.
pub(crate) fn ensure_sizes(evaluators: &[EvaluatorJudgment], n: usize) -> Result<(), AnalysisError> {
    match evaluators.iter().find(|e| e.matrix.size() != n) {
        Some(evaluator) => Err(AnalysisError::invalid_matrix(format!(
            "evaluator '{}' has a {}x{} matrix, expected {}x{}",
            evaluator.id,
            evaluator.matrix.size(),
            evaluator.matrix.size(),
            n,
            n
        ))),
        None => Ok(()),
    }
}

/// Matrix sizes plus one weight per evaluator.
pub(crate) fn ensure_aligned(
    evaluators: &[EvaluatorJudgment],
    n: usize,
    weights: &[f64],
) -> Result<(), AnalysisError> {
    ensure_sizes(evaluators, n)?;
    if weights.len() != evaluators.len() {
        return Err(AnalysisError::invalid_matrix(format!(
            "{} evaluator weights for {} evaluators",
            weights.len(),
            evaluators.len()
        )));
    }
    Ok(())
}

/// Evaluator weights scaled to sum to 1; equal weights when the total is 0.
pub(crate) fn normalized_evaluator_weights(evaluators: &[EvaluatorJudgment]) -> Vec<f64> {
    let raw: Vec<f64> = evaluators.iter().map(|e| e.weight.unwrap_or(1.0)).collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        let k = evaluators.len() as f64;
        return vec![1.0 / k; evaluators.len()];
    }
    raw.into_iter().map(|w| w / total).collect()
}

/// Population standard deviation; 0 for an empty sequence.
pub(crate) fn population_std(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
