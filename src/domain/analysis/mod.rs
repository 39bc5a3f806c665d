//! Analysis Module - Pure domain services for AHP decision analysis.
//!
//! This module contains stateless analyzers that operate on comparison
//! matrices, weights and scores to derive and stress-test a decision.
//!
//! # Components
//!
//! - `MatrixBuilder` / `ComparisonMatrix` - Reciprocal pairwise-comparison matrices
//! - `PriorityEngine` - Principal-eigenvector priorities and consistency (CI, CR)
//! - `GroupConsensus` - AIJ, AIP, fuzzy and entropy aggregation across evaluators
//! - `SensitivityAnalyzer` - Tornado ordering and exact rank-reversal weights
//! - `MonteCarloSimulator` - Ranking stability under log-space noise
//! - `RobustnessSynthesizer` - Weighted robustness score and risk level
//! - `DecisionAnalysis` - The full pipeline over a `DecisionProblem`
//!
//! # Design Philosophy
//!
//! All analyzers are pure and synchronous. They take values as input and
//! return new values; nothing here performs I/O. Randomness is confined to
//! the Monte Carlo simulator and is seedable.

mod comparison_matrix;
mod decision_problem;
mod entropy_consensus;
mod errors;
mod events;
mod fuzzy_consensus;
mod group_consensus;
mod monte_carlo;
mod noise;
mod priority_engine;
mod robustness;
mod sensitivity_analyzer;
mod weights;

// Re-export all public types
pub use comparison_matrix::{
    ComparisonMatrix, Judgment, MatrixBuilder, RECIPROCAL_TOLERANCE, SAATY_MAX, SAATY_MIN,
};
pub use decision_problem::{
    CriterionJudgment, CriterionScores, DecisionAnalysis, DecisionAnalysisReport,
    DecisionAnalysisSettings, DecisionProblem, EvaluatorInput,
};
pub use entropy_consensus::{
    cosine_similarity, CriterionConsensus, EntropyConsensus, EntropyConsensusResult,
    EvaluatorAgreement, PairwiseAgreement, OUTLIER_AGREEMENT_THRESHOLD,
};
pub use errors::AnalysisError;
pub use events::DecisionAnalysisCompleted;
pub use fuzzy_consensus::{FuzzyConsensus, FuzzyConsensusResult, FuzzyWeight, LinguisticLabel, Tfn};
pub use group_consensus::{
    AggregationStrategy, AijResult, AipResult, EvaluatorJudgment, GroupConsensus,
    GroupConsensusResult, IndividualResult,
};
pub use monte_carlo::{
    AlternativeStatistics, CriterionStatistics, MonteCarloConfig, MonteCarloResult,
    MonteCarloSimulator, Termination, MAX_ITERATIONS, MAX_UNCERTAINTY_LEVEL, MIN_ITERATIONS,
};
pub use noise::{LogNoise, NoiseDistribution};
pub use priority_engine::{
    random_index, ConsistencyMetrics, PriorityEngine, PriorityResult, PriorityVector,
    CONSISTENCY_THRESHOLD, RANDOM_INDEX,
};
pub use robustness::{
    ComponentWeights, RiskLevel, RobustnessComponents, RobustnessConfig, RobustnessInputs,
    RobustnessResult, RobustnessSynthesizer,
};
pub use sensitivity_analyzer::{
    RankedAlternative, ReversalPoint, SensitivityAnalyzer, SensitivityConfig, SensitivityEntry,
    SensitivityReport,
};
pub use weights::{ScoreTable, ScoreTableBuilder, WeightEntry, WeightMap};
