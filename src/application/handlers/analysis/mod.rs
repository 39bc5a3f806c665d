//! Analysis command handlers.
//!
//! Handlers that run decision analyses and publish their outcomes.

mod run_decision_analysis;

pub use run_decision_analysis::{
    RunDecisionAnalysisCommand, RunDecisionAnalysisHandler, RunDecisionAnalysisResult,
};
