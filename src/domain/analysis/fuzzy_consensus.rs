//! Fuzzy Consensus - Triangular fuzzy numbers over Saaty judgments.
//!
//! Each crisp judgment is replaced by a triangular fuzzy number (TFN), the
//! evaluators' TFNs are combined by weighted geometric mean, and per-criterion
//! fuzzy weights are defuzzified by centroid.

use serde::{Deserialize, Serialize};

use super::group_consensus::ensure_aligned;
use super::{AnalysisError, EvaluatorJudgment, PriorityVector, WeightMap};

/// Triangular fuzzy number `(lower, middle, upper)` with `lower ≤ middle ≤ upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tfn {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

impl Tfn {
    pub const ONE: Tfn = Tfn {
        lower: 1.0,
        middle: 1.0,
        upper: 1.0,
    };

    pub fn new(lower: f64, middle: f64, upper: f64) -> Self {
        Self {
            lower,
            middle,
            upper,
        }
    }

    /// Fuzzy equivalent of an integer Saaty judgment in `1..=9`.
    ///
    /// 1 → (1,1,1), 9 → (8,9,9), otherwise (x−1, x, x+1).
    pub fn from_scale(value: u8) -> Self {
        match value.clamp(1, 9) {
            1 => Self::ONE,
            9 => Self::new(8.0, 9.0, 9.0),
            x => {
                let x = f64::from(x);
                Self::new(x - 1.0, x, x + 1.0)
            }
        }
    }

    /// Fuzzifies an arbitrary positive judgment.
    ///
    /// Values ≥ 1 round to the nearest scale integer; values below 1 use the
    /// reciprocal of the TFN for the rounded inverse.
    pub fn from_judgment(value: f64) -> Self {
        if value >= 1.0 {
            Self::from_scale(round_to_scale(value))
        } else {
            Self::from_scale(round_to_scale(1.0 / value)).reciprocal()
        }
    }

    /// `(1/u, 1/m, 1/l)`
    pub fn reciprocal(&self) -> Self {
        Self::new(1.0 / self.upper, 1.0 / self.middle, 1.0 / self.lower)
    }

    /// Centroid `(l + m + u) / 3`.
    pub fn centroid(&self) -> f64 {
        (self.lower + self.middle + self.upper) / 3.0
    }
}

fn round_to_scale(value: f64) -> u8 {
    value.round().clamp(1.0, 9.0) as u8
}

/// Linguistic label attached to a defuzzified weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinguisticLabel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl LinguisticLabel {
    /// Maps a normalized weight onto the label bands.
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 0.3 {
            LinguisticLabel::VeryHigh
        } else if weight >= 0.2 {
            LinguisticLabel::High
        } else if weight >= 0.1 {
            LinguisticLabel::Medium
        } else if weight >= 0.05 {
            LinguisticLabel::Low
        } else {
            LinguisticLabel::VeryLow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LinguisticLabel::VeryHigh => "Very High",
            LinguisticLabel::High => "High",
            LinguisticLabel::Medium => "Medium",
            LinguisticLabel::Low => "Low",
            LinguisticLabel::VeryLow => "Very Low",
        }
    }
}

/// Fuzzy and crisp weight of one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyWeight {
    pub criterion_id: String,
    /// Normalized fuzzy weight `(l/Σu, m/Σm, u/Σl)`.
    pub fuzzy_weight: Tfn,
    /// Centroid of the row geometric mean, normalized across criteria.
    pub weight: f64,
    pub label: LinguisticLabel,
}

/// Result of the fuzzy consensus strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyConsensusResult {
    /// Crisp consensus weights.
    pub priorities: WeightMap,
    pub fuzzy_weights: Vec<FuzzyWeight>,
    /// Aggregated fuzzy comparison matrix, row by row.
    pub aggregated: Vec<Vec<Tfn>>,
}

/// Fuzzy group aggregation.
pub struct FuzzyConsensus;

impl FuzzyConsensus {
    /// Computes fuzzy consensus weights.
    ///
    /// `evaluator_weights` must be normalized and aligned with `evaluators`.
    ///
    /// # Errors
    /// `InvalidMatrix` if a matrix does not match `criteria` or the weights
    /// are not one per evaluator.
    pub fn compute(
        criteria: &[String],
        evaluators: &[EvaluatorJudgment],
        evaluator_weights: &[f64],
    ) -> Result<FuzzyConsensusResult, AnalysisError> {
        let n = criteria.len();
        ensure_aligned(evaluators, n, evaluator_weights)?;

        let aggregated: Vec<Vec<Tfn>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            return Tfn::ONE;
                        }
                        let fuzzy: Vec<Tfn> = evaluators
                            .iter()
                            .map(|e| Tfn::from_judgment(e.matrix[(i, j)]))
                            .collect();
                        weighted_geometric_mean(&fuzzy, evaluator_weights)
                    })
                    .collect()
            })
            .collect();

        let row_means: Vec<Tfn> = aggregated
            .iter()
            .map(|row| weighted_geometric_mean(row, &vec![1.0 / n as f64; n]))
            .collect();

        let sum_lower: f64 = row_means.iter().map(|t| t.lower).sum();
        let sum_middle: f64 = row_means.iter().map(|t| t.middle).sum();
        let sum_upper: f64 = row_means.iter().map(|t| t.upper).sum();

        let crisp =
            PriorityVector::normalized(row_means.iter().map(Tfn::centroid).collect());

        let fuzzy_weights = criteria
            .iter()
            .zip(&row_means)
            .zip(crisp.values())
            .map(|((id, mean), weight)| FuzzyWeight {
                criterion_id: id.clone(),
                fuzzy_weight: Tfn::new(
                    mean.lower / sum_upper,
                    mean.middle / sum_middle,
                    mean.upper / sum_lower,
                ),
                weight: *weight,
                label: LinguisticLabel::from_weight(*weight),
            })
            .collect();

        Ok(FuzzyConsensusResult {
            priorities: WeightMap::from_priorities(criteria, &crisp)?,
            fuzzy_weights,
            aggregated,
        })
    }
}

/// Component-wise weighted geometric mean of TFNs.
fn weighted_geometric_mean(values: &[Tfn], weights: &[f64]) -> Tfn {
    let mean = |component: fn(&Tfn) -> f64| -> f64 {
        values
            .iter()
            .zip(weights)
            .filter(|(_, w)| **w > 0.0)
            .map(|(t, w)| w * component(t).ln())
            .sum::<f64>()
            .exp()
    };
    Tfn::new(mean(|t| t.lower), mean(|t| t.middle), mean(|t| t.upper))
}
