//! Analysis domain events.
//!
//! Events published when a decision analysis completes. These enable:
//! - Audit trails for analysis runs
//! - Downstream consumers that render or persist reports

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, AnalysisId, EventId, Timestamp};

use super::{AggregationStrategy, DecisionAnalysisReport, RiskLevel, WeightMap};

/// Published when a full decision analysis has run.
///
/// Carries the headline results only; the full report travels separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionAnalysisCompleted {
    /// Unique event identifier for deduplication.
    pub event_id: EventId,
    /// The analysis run this event describes.
    pub analysis_id: AnalysisId,
    /// Strategy used to produce the criteria weights.
    pub aggregation: AggregationStrategy,
    /// Consensus criteria weights.
    pub criteria_weights: WeightMap,
    /// Leader under the consensus weights (None if there are no alternatives).
    pub recommended_alternative: Option<String>,
    /// Alternative most often ranked first in simulation.
    pub dominant_alternative: Option<String>,
    pub rank_stability: f64,
    pub robustness_score: f64,
    pub risk_level: RiskLevel,
    /// Number of criteria whose sweep flips the leader.
    pub rank_reversals: usize,
    /// When the analysis completed.
    pub completed_at: Timestamp,
}

domain_event!(
    DecisionAnalysisCompleted,
    event_type = "analysis.decision_completed",
    schema_version = 1,
    aggregate_id = analysis_id,
    aggregate_type = "Analysis",
    occurred_at = completed_at,
    event_id = event_id
);

impl DecisionAnalysisCompleted {
    /// Summarizes a finished report.
    pub fn from_report(report: &DecisionAnalysisReport) -> Self {
        Self {
            event_id: EventId::new(),
            analysis_id: report.analysis_id,
            aggregation: report.aggregation,
            criteria_weights: report.criteria_weights.clone(),
            recommended_alternative: report.recommended_alternative.clone(),
            dominant_alternative: report.monte_carlo.dominant_alternative.clone(),
            rank_stability: report.monte_carlo.rank_stability,
            robustness_score: report.robustness.overall_score,
            risk_level: report.robustness.risk_level,
            rank_reversals: report
                .sensitivity
                .entries
                .iter()
                .filter(|e| e.has_rank_reversal)
                .count(),
            completed_at: report.completed_at,
        }
    }
}
