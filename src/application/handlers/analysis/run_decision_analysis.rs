//! RunDecisionAnalysisHandler - Command handler for analyzing a decision problem.
//!
//! Runs the CPU-bound analysis pipeline on a blocking thread, then publishes
//! a `DecisionAnalysisCompleted` event summarizing the report.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::analysis::{
    DecisionAnalysis, DecisionAnalysisCompleted, DecisionAnalysisReport, DecisionProblem,
};
use crate::domain::foundation::{DomainError, ErrorCode, SerializableDomainEvent, Timestamp};
use crate::ports::EventPublisher;

/// Command to analyze one decision problem.
#[derive(Debug, Clone)]
pub struct RunDecisionAnalysisCommand {
    pub problem: DecisionProblem,
    /// Correlation ID attached to the published event.
    pub correlation_id: Option<String>,
}

/// Result of a successful analysis.
#[derive(Debug, Clone)]
pub struct RunDecisionAnalysisResult {
    pub report: DecisionAnalysisReport,
    pub event: DecisionAnalysisCompleted,
}

/// Handler for running decision analyses.
pub struct RunDecisionAnalysisHandler {
    analysis: Arc<DecisionAnalysis>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl RunDecisionAnalysisHandler {
    pub fn new(analysis: Arc<DecisionAnalysis>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            analysis,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: RunDecisionAnalysisCommand,
    ) -> Result<RunDecisionAnalysisResult, DomainError> {
        // 1. Run the pipeline off the async executor
        let started_at = Timestamp::now();
        let analysis = Arc::clone(&self.analysis);
        let problem = cmd.problem;
        info!(
            criteria = problem.criteria.len(),
            alternatives = problem.alternatives.len(),
            evaluators = problem.evaluators.len(),
            aggregation = ?problem.aggregation,
            "Starting decision analysis"
        );
        let report = tokio::task::spawn_blocking(move || analysis.run(&problem))
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Analysis task failed: {}", e),
                )
            })?
            .map_err(|e| {
                warn!(error = %e, "Decision analysis rejected");
                DomainError::from(e)
            })?;

        debug!(
            analysis_id = %report.analysis_id,
            overall_consensus = report.entropy.overall_consensus,
            outliers = report.entropy.outliers.len(),
            "Group consensus computed"
        );
        info!(
            analysis_id = %report.analysis_id,
            recommended = ?report.recommended_alternative,
            valid_iterations = report.monte_carlo.valid_iterations,
            rank_stability = report.monte_carlo.rank_stability,
            robustness = report.robustness.overall_score,
            risk = ?report.robustness.risk_level,
            "Decision analysis completed"
        );

        // 2. Create and publish event
        let event = DecisionAnalysisCompleted::from_report(&report);
        let mut envelope = event.to_envelope().map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize event: {}", e),
            )
        })?;
        if let Some(correlation_id) = cmd.correlation_id {
            envelope = envelope.with_correlation_id(correlation_id);
        }
        self.event_publisher.publish(envelope).await?;

        debug!(
            analysis_id = %report.analysis_id,
            elapsed_ms = report.completed_at.duration_since(&started_at).num_milliseconds(),
            "Published DecisionAnalysisCompleted event"
        );

        Ok(RunDecisionAnalysisResult { report, event })
    }
}
