//! Decision Analysis - The full pipeline from raw judgments to a robustness verdict.
//!
//! # Flow
//!
//! 1. Build each evaluator's criteria matrix (sparse judgments or a full matrix)
//! 2. Aggregate evaluators into consensus criteria weights
//! 3. Compute entropy consensus diagnostics
//! 4. Sweep criteria weights for sensitivity and rank reversals
//! 5. Simulate judgment and score noise on the AIJ group matrix
//! 6. Synthesize robustness

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AnalysisId, Timestamp};

use super::{
    AggregationStrategy, AnalysisError, ComparisonMatrix, EntropyConsensusResult,
    EvaluatorJudgment, GroupConsensus, GroupConsensusResult, MatrixBuilder, MonteCarloConfig,
    MonteCarloResult, MonteCarloSimulator, RobustnessConfig, RobustnessInputs, RobustnessResult,
    RobustnessSynthesizer, ScoreTable, SensitivityAnalyzer, SensitivityConfig, SensitivityReport,
    WeightMap,
};

/// "`preferred` is `value` times as important as `other`", by criterion id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionJudgment {
    pub preferred: String,
    pub other: String,
    pub value: f64,
}

/// One evaluator's input: either sparse judgments or a complete matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorInput {
    pub id: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub judgments: Vec<CriterionJudgment>,
    /// Full matrix in criteria order; takes precedence over `judgments`.
    #[serde(default)]
    pub matrix: Option<ComparisonMatrix>,
}

/// Every alternative's local score under one criterion, in alternative order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScores {
    pub criterion_id: String,
    pub values: Vec<f64>,
}

/// A complete decision to analyze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionProblem {
    /// Criteria in canonical order.
    pub criteria: Vec<String>,
    /// Alternatives in canonical order.
    pub alternatives: Vec<String>,
    pub evaluators: Vec<EvaluatorInput>,
    pub scores: Vec<CriterionScores>,
    /// Strategy producing the consensus criteria weights.
    #[serde(default)]
    pub aggregation: AggregationStrategy,
}

impl DecisionProblem {
    /// Checks ids and strategy before any computation.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.criteria.is_empty() {
            return Err(AnalysisError::invalid_matrix(
                "at least one criterion is required",
            ));
        }
        if self.alternatives.is_empty() {
            return Err(AnalysisError::invalid_parameter(
                "alternatives",
                "at least one alternative is required",
            ));
        }
        ensure_unique("criteria", &self.criteria)?;
        ensure_unique("alternatives", &self.alternatives)?;
        if self.evaluators.is_empty() {
            return Err(AnalysisError::NoEvaluators);
        }
        if self.aggregation == AggregationStrategy::Entropy {
            return Err(AnalysisError::invalid_parameter(
                "aggregation",
                "entropy consensus does not produce criteria weights; use aij, aip or fuzzy",
            ));
        }
        Ok(())
    }

    /// Builds each evaluator's comparison matrix in criteria order.
    ///
    /// Supplied full matrices must be reciprocal.
    pub fn evaluator_judgments(&self) -> Result<Vec<EvaluatorJudgment>, AnalysisError> {
        self.evaluators
            .iter()
            .map(|evaluator| {
                let matrix = match &evaluator.matrix {
                    Some(matrix) => {
                        matrix.validate_reciprocal()?;
                        matrix.clone()
                    }
                    None => evaluator
                        .judgments
                        .iter()
                        .fold(MatrixBuilder::new(self.criteria.clone()), |builder, j| {
                            builder.judge(&j.preferred, &j.other, j.value)
                        })
                        .build(),
                };
                Ok(EvaluatorJudgment {
                    id: evaluator.id.clone(),
                    matrix,
                    weight: evaluator.weight,
                })
            })
            .collect()
    }

    /// Builds the score table; criteria without scores score 0 everywhere.
    pub fn score_table(&self) -> Result<ScoreTable, AnalysisError> {
        let mut builder = ScoreTable::builder()
            .criteria(self.criteria.clone())
            .alternatives(self.alternatives.clone());

        for scores in &self.scores {
            if scores.values.len() != self.alternatives.len() {
                return Err(AnalysisError::invalid_parameter(
                    "scores",
                    format!(
                        "criterion '{}' has {} scores for {} alternatives",
                        scores.criterion_id,
                        scores.values.len(),
                        self.alternatives.len()
                    ),
                ));
            }
            builder = builder.criterion_scores(scores.criterion_id.clone(), &scores.values);
        }

        builder.build()
    }
}

fn ensure_unique(name: &str, ids: &[String]) -> Result<(), AnalysisError> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(AnalysisError::invalid_parameter(
            name,
            format!("duplicate id '{}'", duplicate),
        ));
    }
    Ok(())
}

/// Settings for every analyzer in the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnalysisSettings {
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    #[serde(default)]
    pub robustness: RobustnessConfig,
}

/// Everything computed for one decision problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnalysisReport {
    pub analysis_id: AnalysisId,
    pub aggregation: AggregationStrategy,
    /// Consensus criteria weights from the chosen strategy.
    pub criteria_weights: WeightMap,
    /// Leader under the consensus weights.
    pub recommended_alternative: Option<String>,
    pub consensus: GroupConsensusResult,
    pub entropy: EntropyConsensusResult,
    pub sensitivity: SensitivityReport,
    pub monte_carlo: MonteCarloResult,
    pub robustness: RobustnessResult,
    pub completed_at: Timestamp,
}

/// Runs the complete decision analysis pipeline.
#[derive(Debug, Clone, Default)]
pub struct DecisionAnalysis {
    settings: DecisionAnalysisSettings,
}

impl DecisionAnalysis {
    pub fn new(settings: DecisionAnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DecisionAnalysisSettings {
        &self.settings
    }

    /// Analyzes a decision problem.
    ///
    /// # Errors
    /// Any `AnalysisError` raised by input validation or an analyzer; a Monte
    /// Carlo run with no valid iterations is not an error.
    pub fn run(&self, problem: &DecisionProblem) -> Result<DecisionAnalysisReport, AnalysisError> {
        let analysis_id = AnalysisId::new();
        problem.validate()?;
        let evaluators = problem.evaluator_judgments()?;
        let scores = problem.score_table()?;
        let group = GroupConsensus::new(problem.criteria.clone());

        let consensus = group.aggregate(problem.aggregation, &evaluators)?;
        let criteria_weights = consensus
            .consensus_weights()
            .cloned()
            .ok_or_else(|| {
                AnalysisError::invalid_parameter("aggregation", "strategy produced no weights")
            })?;
        let entropy = group.entropy_consensus(&evaluators)?;

        let sensitivity = SensitivityAnalyzer::new(self.settings.sensitivity.clone())
            .analyze(&criteria_weights, &scores)?;

        let evaluator_weights = group.validate(&evaluators)?;
        let group_matrix = GroupConsensus::geometric_mean_matrix(&evaluators, &evaluator_weights)?;
        let monte_carlo = MonteCarloSimulator::new(self.settings.monte_carlo.clone())
            .run(&group_matrix, &scores)?;

        let evaluator_consistency: Vec<_> =
            entropy.individual.iter().map(|r| r.consistency).collect();
        let robustness = RobustnessSynthesizer::new(self.settings.robustness.clone()).synthesize(
            RobustnessInputs {
                sensitivity: Some(&sensitivity),
                monte_carlo: Some(&monte_carlo),
                consensus: Some(&entropy),
                evaluator_consistency: &evaluator_consistency,
            },
        )?;

        let recommended_alternative = sensitivity.top_alternative().map(str::to_string);

        Ok(DecisionAnalysisReport {
            analysis_id,
            aggregation: problem.aggregation,
            criteria_weights,
            recommended_alternative,
            consensus,
            entropy,
            sensitivity,
            monte_carlo,
            robustness,
            completed_at: Timestamp::now(),
        })
    }
}
