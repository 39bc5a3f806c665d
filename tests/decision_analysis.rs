//! Integration tests for the decision analysis pipeline.
//!
//! These tests verify the end-to-end flow:
//! 1. Judgments become reciprocal comparison matrices
//! 2. Priorities and consistency come from the principal eigenvector
//! 3. Sensitivity sweeps locate the weight where the leader changes
//! 4. Monte Carlo under negligible noise reproduces the deterministic ranking
//! 5. The command handler runs everything and publishes a completion event

use std::sync::Arc;

use decision_analytics::adapters::InMemoryEventBus;
use decision_analytics::application::handlers::{
    RunDecisionAnalysisCommand, RunDecisionAnalysisHandler,
};
use decision_analytics::domain::analysis::{
    AggregationStrategy, ComparisonMatrix, DecisionAnalysis, DecisionAnalysisCompleted,
    DecisionAnalysisSettings, DecisionProblem, EvaluatorJudgment, GroupConsensus, MatrixBuilder,
    MonteCarloConfig, MonteCarloSimulator, PriorityEngine, ScoreTable, SensitivityAnalyzer,
    SensitivityConfig, Termination, WeightMap,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Saaty's classic three-criteria example.
fn textbook_matrix() -> ComparisonMatrix {
    MatrixBuilder::new(vec!["cost", "quality", "delivery"])
        .judge("cost", "quality", 3.0)
        .judge("cost", "delivery", 5.0)
        .judge("quality", "delivery", 3.0)
        .build()
}

fn crossing_scores() -> ScoreTable {
    ScoreTable::builder()
        .criteria(vec!["cost", "quality"])
        .alternatives(vec!["A", "B"])
        .criterion_scores("cost", &[0.8, 0.3])
        .criterion_scores("quality", &[0.2, 0.7])
        .build()
        .unwrap()
}

const PROBLEM_JSON: &str = r#"{
    "criteria": ["cost", "quality", "delivery"],
    "alternatives": ["vendor_a", "vendor_b", "vendor_c"],
    "evaluators": [
        {"id": "finance", "weight": 2.0, "judgments": [
            {"preferred": "cost", "other": "quality", "value": 3},
            {"preferred": "cost", "other": "delivery", "value": 5},
            {"preferred": "quality", "other": "delivery", "value": 3}
        ]},
        {"id": "engineering", "judgments": [
            {"preferred": "quality", "other": "cost", "value": 2},
            {"preferred": "cost", "other": "delivery", "value": 3},
            {"preferred": "quality", "other": "delivery", "value": 5}
        ]},
        {"id": "operations", "judgments": [
            {"preferred": "cost", "other": "quality", "value": 2},
            {"preferred": "delivery", "other": "cost", "value": 1},
            {"preferred": "quality", "other": "delivery", "value": 2}
        ]}
    ],
    "scores": [
        {"criterion_id": "cost", "values": [0.6, 0.3, 0.1]},
        {"criterion_id": "quality", "values": [0.5, 0.3, 0.2]},
        {"criterion_id": "delivery", "values": [0.4, 0.4, 0.2]}
    ],
    "aggregation": "aij"
}"#;

fn seeded_settings() -> DecisionAnalysisSettings {
    DecisionAnalysisSettings {
        monte_carlo: MonteCarloConfig {
            iterations: 1000,
            ..MonteCarloConfig::default()
        }
        .with_seed(11),
        ..DecisionAnalysisSettings::default()
    }
}

// =============================================================================
// Priorities and consistency
// =============================================================================

#[test]
fn textbook_matrix_yields_known_priorities() {
    let result = PriorityEngine::derive(&textbook_matrix());
    let w = result.priorities.values();

    assert!((w[0] - 0.637).abs() < 0.005, "cost weight was {}", w[0]);
    assert!((w[1] - 0.258).abs() < 0.005, "quality weight was {}", w[1]);
    assert!((w[2] - 0.105).abs() < 0.005, "delivery weight was {}", w[2]);
    assert!((result.consistency.lambda_max - 3.039).abs() < 0.005);
    assert!(result.consistency.cr > 0.02 && result.consistency.cr < 0.05);
    assert!(result.consistency.is_consistent);
}

#[test]
fn contradictory_judgments_are_flagged_inconsistent() {
    // a > b, b > c but c > a
    let matrix = MatrixBuilder::new(vec!["a", "b", "c"])
        .judge("a", "b", 9.0)
        .judge("b", "c", 9.0)
        .judge("c", "a", 9.0)
        .build();

    let result = PriorityEngine::derive(&matrix);
    assert!(result.consistency.cr > 0.1);
    assert!(!result.consistency.is_consistent);
}

#[test]
fn single_evaluator_aij_matches_individual_priorities() {
    let group = GroupConsensus::new(vec!["cost", "quality", "delivery"]);
    let evaluators = vec![EvaluatorJudgment::new("solo", textbook_matrix())];

    let aij = group.aggregate_judgments(&evaluators).unwrap();
    let direct = PriorityEngine::derive(&textbook_matrix());

    for (i, id) in ["cost", "quality", "delivery"].iter().enumerate() {
        let weight = aij.priorities.get(id).unwrap();
        assert!((weight - direct.priorities.values()[i]).abs() < 1e-9);
    }
}

// =============================================================================
// Sensitivity
// =============================================================================

#[test]
fn sweep_finds_exact_rank_reversal() {
    let weights = WeightMap::new(&ids(&["cost", "quality"]), &[0.6, 0.4]).unwrap();
    let report = SensitivityAnalyzer::new(SensitivityConfig::default())
        .analyze(&weights, &crossing_scores())
        .unwrap();

    assert_eq!(report.top_alternative(), Some("A"));

    let cost = report
        .entries
        .iter()
        .find(|e| e.criterion_id == "cost")
        .unwrap();
    assert!(cost.has_rank_reversal);
    assert_eq!(cost.reversal_points.len(), 1);

    let point = &cost.reversal_points[0];
    assert!((point.weight - 0.5).abs() < 0.002, "crossing at {}", point.weight);
    assert_eq!(point.from_alternative, "B");
    assert_eq!(point.to_alternative, "A");
}

#[test]
fn dominant_alternative_never_reverses() {
    let weights = WeightMap::new(&ids(&["cost", "quality"]), &[0.5, 0.5]).unwrap();
    let scores = ScoreTable::builder()
        .criteria(vec!["cost", "quality"])
        .alternatives(vec!["A", "B"])
        .criterion_scores("cost", &[0.9, 0.1])
        .criterion_scores("quality", &[0.8, 0.2])
        .build()
        .unwrap();

    let report = SensitivityAnalyzer::default()
        .analyze(&weights, &scores)
        .unwrap();
    assert!(report.entries.iter().all(|e| !e.has_rank_reversal));
    assert_eq!(report.stable_fraction(), Some(1.0));
}

// =============================================================================
// Monte Carlo
// =============================================================================

#[test]
fn negligible_noise_reproduces_deterministic_ranking() {
    let matrix = ComparisonMatrix::from_weights(&[0.5, 0.3, 0.2]).unwrap();
    let scores = ScoreTable::builder()
        .criteria(vec!["cost", "quality", "delivery"])
        .alternatives(vec!["A", "B", "C"])
        .criterion_scores("cost", &[0.6, 0.3, 0.1])
        .criterion_scores("quality", &[0.6, 0.3, 0.1])
        .criterion_scores("delivery", &[0.6, 0.3, 0.1])
        .build()
        .unwrap();
    let config = MonteCarloConfig {
        iterations: 1000,
        uncertainty_level: 0.001,
        ..MonteCarloConfig::default()
    }
    .with_seed(3);

    let result = MonteCarloSimulator::new(config)
        .run(&matrix, &scores)
        .unwrap();

    assert_eq!(result.valid_iterations, 1000);
    assert_eq!(result.termination, Termination::Completed);
    assert_eq!(result.dominant_alternative.as_deref(), Some("A"));
    assert!(result.rank_stability > 0.999);

    let cost = result.criterion("cost").unwrap();
    assert!((cost.mean_weight - 0.5).abs() < 0.01);

    let a = result.alternative("A").unwrap();
    assert!(a.ci_lower <= a.mean_score && a.mean_score <= a.ci_upper);
}

#[test]
fn seeded_runs_are_reproducible() {
    let matrix = textbook_matrix();
    let scores = ScoreTable::builder()
        .criteria(vec!["cost", "quality", "delivery"])
        .alternatives(vec!["A", "B"])
        .criterion_scores("cost", &[0.55, 0.45])
        .criterion_scores("quality", &[0.4, 0.6])
        .criterion_scores("delivery", &[0.5, 0.5])
        .build()
        .unwrap();
    let simulator = MonteCarloSimulator::new(
        MonteCarloConfig {
            iterations: 1000,
            uncertainty_level: 0.3,
            ..MonteCarloConfig::default()
        }
        .with_seed(99),
    );

    let first = simulator.run(&matrix, &scores).unwrap();
    let second = simulator.run(&matrix, &scores).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn pipeline_produces_coherent_report() {
    let problem: DecisionProblem = serde_json::from_str(PROBLEM_JSON).unwrap();
    let report = DecisionAnalysis::new(seeded_settings())
        .run(&problem)
        .unwrap();

    assert!((report.criteria_weights.total() - 1.0).abs() < 1e-9);
    assert_eq!(report.recommended_alternative.as_deref(), Some("vendor_a"));
    assert_eq!(report.sensitivity.entries.len(), 3);
    assert_eq!(report.entropy.evaluators.len(), 3);
    assert!(report.monte_carlo.valid_iterations > 0);
    assert!((0.0..=1.0).contains(&report.robustness.overall_score));
    assert!(!report.robustness.recommendations.is_empty());
}

#[test]
fn every_weight_strategy_runs_end_to_end() {
    let mut problem: DecisionProblem = serde_json::from_str(PROBLEM_JSON).unwrap();
    let analysis = DecisionAnalysis::new(seeded_settings());

    for strategy in [
        AggregationStrategy::Aij,
        AggregationStrategy::Aip,
        AggregationStrategy::Fuzzy,
    ] {
        problem.aggregation = strategy;
        let report = analysis.run(&problem).unwrap();
        assert_eq!(report.aggregation, strategy);
        assert!((report.criteria_weights.total() - 1.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn handler_publishes_event_matching_report() {
    let problem: DecisionProblem = serde_json::from_str(PROBLEM_JSON).unwrap();
    let bus = Arc::new(InMemoryEventBus::new());
    let handler = RunDecisionAnalysisHandler::new(
        Arc::new(DecisionAnalysis::new(seeded_settings())),
        bus.clone(),
    );

    let result = handler
        .handle(RunDecisionAnalysisCommand {
            problem,
            correlation_id: Some("batch-7".to_string()),
        })
        .await
        .unwrap();

    let events = bus.events_of_type("analysis.decision_completed");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].aggregate_id, result.report.analysis_id.to_string());
    assert_eq!(events[0].metadata.correlation_id.as_deref(), Some("batch-7"));

    let payload: DecisionAnalysisCompleted = events[0].payload_as().unwrap();
    assert_eq!(payload.recommended_alternative, result.report.recommended_alternative);
    assert_eq!(payload.risk_level, result.report.robustness.risk_level);
}
