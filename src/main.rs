//! Decision Analytics CLI
//!
//! Reads a decision problem as JSON (from a file or stdin), runs the full
//! analysis and writes the report as JSON to stdout.

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use decision_analytics::adapters::InMemoryEventBus;
use decision_analytics::application::handlers::{
    RunDecisionAnalysisCommand, RunDecisionAnalysisHandler,
};
use decision_analytics::config::AppConfig;
use decision_analytics::domain::analysis::{DecisionAnalysis, DecisionProblem};
use decision_analytics::telemetry;

/// Decision Analytics - AHP priorities, consensus and robustness
#[derive(Parser)]
#[command(name = "decision-analytics")]
#[command(version)]
#[command(about = "Analyze a multi-criteria decision problem")]
struct Cli {
    /// Decision problem JSON file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Configuration file, overridden by DECISION_ANALYTICS__* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible Monte Carlo run
    #[arg(long)]
    seed: Option<u64>,

    /// Correlation ID attached to the published event
    #[arg(long)]
    correlation_id: Option<String>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    telemetry::init_tracing(&config.telemetry)?;

    let mut settings = config.settings();
    if let Some(seed) = cli.seed {
        settings.monte_carlo.seed = Some(seed);
    }

    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let problem: DecisionProblem = serde_json::from_str(&raw)?;

    let bus = Arc::new(InMemoryEventBus::new());
    let handler =
        RunDecisionAnalysisHandler::new(Arc::new(DecisionAnalysis::new(settings)), bus.clone());
    let result = handler
        .handle(RunDecisionAnalysisCommand {
            problem,
            correlation_id: cli.correlation_id,
        })
        .await?;

    info!(
        analysis_id = %result.report.analysis_id,
        events = bus.event_count(),
        "Analysis complete"
    );

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result.report)?
    } else {
        serde_json::to_string(&result.report)?
    };
    println!("{}", output);
    Ok(())
}
