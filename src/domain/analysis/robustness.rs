//! Robustness Synthesizer - One score and risk level from the analysis signals.
//!
//! Combines four [0, 1] components with configurable weights:
//!
//! | Component | Source | Default weight |
//! |-----------|--------|----------------|
//! | sensitivity_stability | criteria without rank reversal | 0.3 |
//! | monte_carlo_stability | rank-1 probability of the dominant alternative | 0.3 |
//! | group_consensus | overall entropy consensus | 0.2 |
//! | consistency_quality | evaluators with CR below the excellent threshold | 0.2 |
//!
//! A missing signal counts as 0.5.

use serde::{Deserialize, Serialize};

use super::{AnalysisError, ConsistencyMetrics, EntropyConsensusResult, MonteCarloResult, SensitivityReport};

/// Score used for a component whose signal is unavailable.
pub const UNAVAILABLE_COMPONENT_SCORE: f64 = 0.5;

/// Components below this produce a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.5;

pub const LOW_RISK_THRESHOLD: f64 = 0.7;
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn default_sensitivity_weight() -> f64 {
    0.3
}

fn default_monte_carlo_weight() -> f64 {
    0.3
}

fn default_consensus_weight() -> f64 {
    0.2
}

fn default_consistency_weight() -> f64 {
    0.2
}

fn default_excellent_cr_threshold() -> f64 {
    0.05
}

/// Weights of the four robustness components; must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    #[serde(default = "default_sensitivity_weight")]
    pub sensitivity: f64,
    #[serde(default = "default_monte_carlo_weight")]
    pub monte_carlo: f64,
    #[serde(default = "default_consensus_weight")]
    pub consensus: f64,
    #[serde(default = "default_consistency_weight")]
    pub consistency: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity_weight(),
            monte_carlo: default_monte_carlo_weight(),
            consensus: default_consensus_weight(),
            consistency: default_consistency_weight(),
        }
    }
}

impl ComponentWeights {
    fn as_array(&self) -> [(&'static str, f64); 4] {
        [
            ("sensitivity", self.sensitivity),
            ("monte_carlo", self.monte_carlo),
            ("consensus", self.consensus),
            ("consistency", self.consistency),
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().map(|(_, w)| w).sum()
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, weight) in self.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AnalysisError::invalid_parameter(
                    format!("component_weights.{}", name),
                    format!("must be non-negative, got {}", weight),
                ));
            }
        }
        if (self.total() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::invalid_parameter(
                "component_weights",
                format!("must sum to 1, got {}", self.total()),
            ));
        }
        Ok(())
    }
}

/// Robustness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessConfig {
    #[serde(default)]
    pub component_weights: ComponentWeights,

    /// Evaluators with a CR strictly below this count as excellent.
    #[serde(default = "default_excellent_cr_threshold")]
    pub excellent_cr_threshold: f64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            component_weights: ComponentWeights::default(),
            excellent_cr_threshold: default_excellent_cr_threshold(),
        }
    }
}

impl RobustnessConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.component_weights.validate()?;
        if !self.excellent_cr_threshold.is_finite() || self.excellent_cr_threshold < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "excellent_cr_threshold",
                format!("must be non-negative, got {}", self.excellent_cr_threshold),
            ));
        }
        Ok(())
    }
}

/// Overall risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= LOW_RISK_THRESHOLD {
            RiskLevel::Low
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// The four normalized component scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobustnessComponents {
    pub sensitivity_stability: f64,
    pub monte_carlo_stability: f64,
    pub group_consensus: f64,
    pub consistency_quality: f64,
}

/// Combined robustness assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessResult {
    pub overall_score: f64,
    pub components: RobustnessComponents,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    pub component_weights: ComponentWeights,
}

/// Signals available to the synthesizer. Any of them may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustnessInputs<'a> {
    pub sensitivity: Option<&'a SensitivityReport>,
    pub monte_carlo: Option<&'a MonteCarloResult>,
    pub consensus: Option<&'a EntropyConsensusResult>,
    /// Consistency of each evaluator's individual matrix.
    pub evaluator_consistency: &'a [ConsistencyMetrics],
}

pub const SENSITIVITY_RECOMMENDATION: &str =
    "The ranking flips when some criteria weights move; confirm the weights of the most sensitive criteria before committing.";
pub const MONTE_CARLO_RECOMMENDATION: &str =
    "The leading alternative is unstable under judgment uncertainty; gather more precise comparisons.";
pub const CONSENSUS_RECOMMENDATION: &str =
    "Evaluators disagree on criteria importance; discuss the divergent judgments before finalizing.";
pub const CONSISTENCY_RECOMMENDATION: &str =
    "Few evaluators produced highly consistent judgments; review and revise the inconsistent comparison matrices.";
pub const ROBUST_RECOMMENDATION: &str =
    "The recommendation is robust across every robustness check.";

/// Combines analysis signals into a robustness score.
#[derive(Debug, Clone, Default)]
pub struct RobustnessSynthesizer {
    config: RobustnessConfig,
}

impl RobustnessSynthesizer {
    pub fn new(config: RobustnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RobustnessConfig {
        &self.config
    }

    /// Scores the available signals.
    ///
    /// # Errors
    /// `InvalidParameter` if the component weights are negative or do not sum to 1.
    pub fn synthesize(&self, inputs: RobustnessInputs<'_>) -> Result<RobustnessResult, AnalysisError> {
        self.config.validate()?;

        let components = RobustnessComponents {
            sensitivity_stability: inputs
                .sensitivity
                .and_then(SensitivityReport::stable_fraction)
                .unwrap_or(UNAVAILABLE_COMPONENT_SCORE),
            monte_carlo_stability: inputs
                .monte_carlo
                .filter(|mc| mc.valid_iterations > 0)
                .map(|mc| mc.rank_stability)
                .unwrap_or(UNAVAILABLE_COMPONENT_SCORE),
            group_consensus: inputs
                .consensus
                .map(|c| c.overall_consensus)
                .unwrap_or(UNAVAILABLE_COMPONENT_SCORE),
            consistency_quality: self.consistency_quality(inputs.evaluator_consistency),
        };

        let weights = self.config.component_weights;
        let overall_score = weights.sensitivity * components.sensitivity_stability
            + weights.monte_carlo * components.monte_carlo_stability
            + weights.consensus * components.group_consensus
            + weights.consistency * components.consistency_quality;

        Ok(RobustnessResult {
            overall_score,
            risk_level: RiskLevel::from_score(overall_score),
            recommendations: Self::recommendations(&components),
            components,
            component_weights: weights,
        })
    }

    fn consistency_quality(&self, evaluators: &[ConsistencyMetrics]) -> f64 {
        if evaluators.is_empty() {
            return UNAVAILABLE_COMPONENT_SCORE;
        }
        let excellent = evaluators
            .iter()
            .filter(|m| m.cr < self.config.excellent_cr_threshold)
            .count();
        excellent as f64 / evaluators.len() as f64
    }

    /// One message per weak component, or a single robust message.
    pub fn recommendations(components: &RobustnessComponents) -> Vec<String> {
        let checks = [
            (components.sensitivity_stability, SENSITIVITY_RECOMMENDATION),
            (components.monte_carlo_stability, MONTE_CARLO_RECOMMENDATION),
            (components.group_consensus, CONSENSUS_RECOMMENDATION),
            (components.consistency_quality, CONSISTENCY_RECOMMENDATION),
        ];

        let recommendations: Vec<String> = checks
            .iter()
            .filter(|(score, _)| *score < RECOMMENDATION_THRESHOLD)
            .map(|(_, message)| message.to_string())
            .collect();

        if recommendations.is_empty() {
            vec![ROBUST_RECOMMENDATION.to_string()]
        } else {
            recommendations
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{SensitivityEntry, Termination};

    fn entry(id: &str, reversal: bool) -> SensitivityEntry {
        SensitivityEntry {
            criterion_id: id.to_string(),
            base_weight: 0.5,
            weight_low: 0.25,
            weight_high: 0.75,
            low_score: 0.4,
            high_score: 0.6,
            impact_range: 0.2,
            has_rank_reversal: reversal,
            reversal_points: Vec::new(),
        }
    }

    fn monte_carlo(valid: usize, stability: f64) -> MonteCarloResult {
        MonteCarloResult {
            alternatives: Vec::new(),
            criteria: Vec::new(),
            valid_iterations: valid,
            attempted_iterations: valid,
            discarded_iterations: 0,
            converged: false,
            termination: Termination::Completed,
            dominant_alternative: None,
            rank_stability: stability,
        }
    }

    fn metrics(cr: f64) -> ConsistencyMetrics {
        ConsistencyMetrics {
            lambda_max: 3.0,
            ci: 0.0,
            cr,
            is_consistent: cr <= 0.1,
        }
    }

    #[test]
    fn missing_signals_score_one_half() {
        let result = RobustnessSynthesizer::default()
            .synthesize(RobustnessInputs::default())
            .unwrap();

        assert_eq!(result.components.sensitivity_stability, 0.5);
        assert_eq!(result.components.monte_carlo_stability, 0.5);
        assert_eq!(result.components.group_consensus, 0.5);
        assert_eq!(result.components.consistency_quality, 0.5);
        assert!((result.overall_score - 0.5).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.recommendations, vec![ROBUST_RECOMMENDATION.to_string()]);
    }

    #[test]
    fn combines_weighted_components() {
        let sensitivity = SensitivityReport {
            entries: vec![entry("a", false), entry("b", true), entry("c", false), entry("d", false)],
            base_ranking: Vec::new(),
        };
        let mc = monte_carlo(5_000, 0.9);
        let crs = [metrics(0.01), metrics(0.08)];

        let result = RobustnessSynthesizer::default()
            .synthesize(RobustnessInputs {
                sensitivity: Some(&sensitivity),
                monte_carlo: Some(&mc),
                consensus: None,
                evaluator_consistency: &crs,
            })
            .unwrap();

        assert_eq!(result.components.sensitivity_stability, 0.75);
        assert_eq!(result.components.monte_carlo_stability, 0.9);
        assert_eq!(result.components.consistency_quality, 0.5);
        let expected = 0.3 * 0.75 + 0.3 * 0.9 + 0.2 * 0.5 + 0.2 * 0.5;
        assert!((result.overall_score - expected).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn monte_carlo_without_valid_iterations_is_unavailable() {
        let mc = monte_carlo(0, 0.0);
        let result = RobustnessSynthesizer::default()
            .synthesize(RobustnessInputs {
                monte_carlo: Some(&mc),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.components.monte_carlo_stability, 0.5);
    }

    #[test]
    fn weak_components_each_produce_a_recommendation() {
        let components = RobustnessComponents {
            sensitivity_stability: 0.2,
            monte_carlo_stability: 0.9,
            group_consensus: 0.1,
            consistency_quality: 0.5,
        };
        let recommendations = RobustnessSynthesizer::recommendations(&components);
        assert_eq!(
            recommendations,
            vec![
                SENSITIVITY_RECOMMENDATION.to_string(),
                CONSENSUS_RECOMMENDATION.to_string()
            ]
        );
    }

    #[test]
    fn risk_levels_follow_thresholds() {
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.39), RiskLevel::High);
    }

    #[test]
    fn component_weights_must_sum_to_one() {
        let config = RobustnessConfig {
            component_weights: ComponentWeights {
                sensitivity: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = RobustnessSynthesizer::new(config).synthesize(RobustnessInputs::default());
        assert!(matches!(result, Err(AnalysisError::InvalidParameter { .. })));
    }

    #[test]
    fn negative_component_weight_is_rejected() {
        let weights = ComponentWeights {
            sensitivity: -0.1,
            monte_carlo: 0.7,
            consensus: 0.2,
            consistency: 0.2,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
    }
}
