//! Entropy Consensus - Agreement diagnostics across evaluators.
//!
//! For each criterion the evaluators' weights are treated as a distribution
//! `p_e = w_e / Σ w`, and consensus is `1 − H / ln(k)` with `H = −Σ p_e ln p_e`.
//! Evaluators are also compared pairwise by cosine similarity of their full
//! priority vectors, which is what drives outlier detection.

use serde::{Deserialize, Serialize};

use super::{AnalysisError, IndividualResult};

/// Evaluators whose mean agreement falls below this are outliers.
pub const OUTLIER_AGREEMENT_THRESHOLD: f64 = 0.7;

/// Entropy and consensus for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionConsensus {
    pub criterion_id: String,
    pub entropy: f64,
    /// `1 − H / ln(k)`; 1 when there is a single evaluator or no weight at all.
    pub consensus: f64,
}

/// Cosine similarity between two evaluators' priority vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAgreement {
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

/// How closely one evaluator agrees with the rest of the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorAgreement {
    pub evaluator_id: String,
    /// Mean cosine similarity against every other evaluator.
    pub mean_agreement: f64,
    pub is_outlier: bool,
}

/// Result of the entropy consensus strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyConsensusResult {
    pub criteria: Vec<CriterionConsensus>,
    /// Mean of the per-criterion consensus values.
    pub overall_consensus: f64,
    /// Upper-triangle pairs in evaluator order.
    pub pairwise: Vec<PairwiseAgreement>,
    pub evaluators: Vec<EvaluatorAgreement>,
    pub outliers: Vec<String>,
    pub individual: Vec<IndividualResult>,
}

impl EntropyConsensusResult {
    /// Similarity between two evaluators, in either order.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        if a == b && self.individual.iter().any(|r| r.evaluator_id == a) {
            return Some(1.0);
        }
        self.pairwise
            .iter()
            .find(|p| (p.first == a && p.second == b) || (p.first == b && p.second == a))
            .map(|p| p.similarity)
    }
}

/// Entropy-based group diagnostics.
pub struct EntropyConsensus;

impl EntropyConsensus {
    /// Computes consensus diagnostics from per-evaluator priorities.
    ///
    /// # Errors
    /// `InvalidMatrix` if an evaluator's priorities do not cover `criteria`.
    pub fn compute(
        criteria: &[String],
        individual: Vec<IndividualResult>,
    ) -> Result<EntropyConsensusResult, AnalysisError> {
        if let Some(result) = individual.iter().find(|r| r.priorities.len() != criteria.len()) {
            return Err(AnalysisError::invalid_matrix(format!(
                "evaluator '{}' has {} priorities, expected {}",
                result.evaluator_id,
                result.priorities.len(),
                criteria.len()
            )));
        }
        let vectors: Vec<Vec<f64>> = individual.iter().map(|r| r.priorities.values()).collect();

        let per_criterion: Vec<CriterionConsensus> = criteria
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let column: Vec<f64> = vectors.iter().map(|v| v[i]).collect();
                let (entropy, consensus) = Self::criterion_entropy(&column);
                CriterionConsensus {
                    criterion_id: id.clone(),
                    entropy,
                    consensus,
                }
            })
            .collect();

        let overall_consensus = if per_criterion.is_empty() {
            1.0
        } else {
            per_criterion.iter().map(|c| c.consensus).sum::<f64>() / per_criterion.len() as f64
        };

        let k = individual.len();
        let mut pairwise = Vec::new();
        let mut similarity = vec![vec![1.0; k]; k];
        for a in 0..k {
            for b in (a + 1)..k {
                let value = cosine_similarity(&vectors[a], &vectors[b]);
                similarity[a][b] = value;
                similarity[b][a] = value;
                pairwise.push(PairwiseAgreement {
                    first: individual[a].evaluator_id.clone(),
                    second: individual[b].evaluator_id.clone(),
                    similarity: value,
                });
            }
        }

        let evaluators: Vec<EvaluatorAgreement> = individual
            .iter()
            .enumerate()
            .map(|(a, result)| {
                let mean_agreement = if k < 2 {
                    1.0
                } else {
                    (0..k).filter(|b| *b != a).map(|b| similarity[a][b]).sum::<f64>()
                        / (k - 1) as f64
                };
                EvaluatorAgreement {
                    evaluator_id: result.evaluator_id.clone(),
                    mean_agreement,
                    is_outlier: mean_agreement < OUTLIER_AGREEMENT_THRESHOLD,
                }
            })
            .collect();

        let outliers = evaluators
            .iter()
            .filter(|e| e.is_outlier)
            .map(|e| e.evaluator_id.clone())
            .collect();

        Ok(EntropyConsensusResult {
            criteria: per_criterion,
            overall_consensus,
            pairwise,
            evaluators,
            outliers,
            individual,
        })
    }

    /// Returns `(H, 1 − H / ln k)` for one criterion's evaluator weights.
    pub fn criterion_entropy(weights: &[f64]) -> (f64, f64) {
        let total: f64 = weights.iter().sum();
        if weights.len() <= 1 || total <= 0.0 {
            return (0.0, 1.0);
        }

        let entropy: f64 = weights
            .iter()
            .map(|w| w / total)
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.ln())
            .sum();
        let max_entropy = (weights.len() as f64).ln();

        (entropy, 1.0 - entropy / max_entropy)
    }
}

/// Cosine similarity of two vectors; 0 when either has zero length.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
