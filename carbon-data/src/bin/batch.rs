use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use carbon_core::{
    DEFAULT_TIMEOUT_SECS, EstimatorConfig, EstimatorRegistry, MockEstimatorFactory, QuestionSet,
};
use carbon_data::{AnswersCsv, BatchRunner, RowOutcome, SchemaFile};
use carbon_estimator_gemini::GeminiEstimatorFactory;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const CREDENTIAL_ENV: &str = "CARBON_ESTIMATOR_API_KEY";

/// Estimate the carbon footprint of every row in an answers CSV.
///
/// The CSV header names questionnaire fields (e.g. transportType, mileage);
/// each row is pushed through the same step-by-step checks as the
/// interactive wizard before it reaches the estimator. The estimator
/// credential is read from CARBON_ESTIMATOR_API_KEY.
#[derive(Parser, Debug)]
#[command(name = "carbon-batch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing one respondent per row
    #[arg(short, long)]
    answers: PathBuf,

    /// Questionnaire TOML file; overrides --question-set
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Built-in questionnaire (footprint, quick)
    #[arg(short, long, default_value = "footprint")]
    question_set: String,

    /// Estimator backend (mock, gemini)
    #[arg(short, long, default_value = "mock")]
    backend: String,

    /// Model name passed to the backend
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the estimator API
    #[arg(long)]
    endpoint: Option<String>,

    /// Upper bound on each estimator call, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Print one JSON object per row instead of a text summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let schema = match &args.schema {
        Some(path) => SchemaFile::load(path)
            .with_context(|| format!("Failed to load questionnaire: {}", path.display()))?,
        None => QuestionSet::parse(&args.question_set)
            .ok_or_else(|| anyhow!("Unknown question set: {}", args.question_set))?
            .schema(),
    };

    let rows = AnswersCsv::load(&args.answers, &schema)
        .with_context(|| format!("Failed to load answers: {}", args.answers.display()))?;
    eprintln!("Loaded {} rows from {}", rows.len(), args.answers.display());

    let config = EstimatorConfig {
        backend: args.backend.clone(),
        credential: std::env::var(CREDENTIAL_ENV).ok(),
        endpoint: args.endpoint.clone(),
        model: args.model.clone(),
        timeout_secs: args.timeout_secs,
    };

    let mut registry = EstimatorRegistry::new();
    registry.register(Box::new(MockEstimatorFactory));
    registry.register(Box::new(GeminiEstimatorFactory));
    let estimator = registry
        .create(&config)
        .await
        .with_context(|| format!("Failed to create '{}' estimator", config.backend))?;

    let runner = BatchRunner::new(Arc::new(schema), Arc::from(estimator), config.timeout());
    let reports = runner.run(&rows).await.context("Batch run aborted")?;

    let mut estimated = 0;
    for report in &reports {
        if args.json {
            println!("{}", row_json(report.line, &report.outcome));
        } else {
            println!("line {}: {}", report.line, row_text(&report.outcome));
        }
        if matches!(report.outcome, RowOutcome::Estimated(_)) {
            estimated += 1;
        }
    }

    eprintln!("Estimated {} of {} rows.", estimated, reports.len());
    Ok(if estimated == reports.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn row_text(outcome: &RowOutcome) -> String {
    match outcome {
        RowOutcome::Estimated(result) => format!(
            "{} kg/day, {} kg/week, {} kg/month",
            result.daily, result.weekly, result.monthly
        ),
        RowOutcome::Invalid(invalid) => format!("invalid: {invalid}"),
        RowOutcome::Failed(e) => format!("failed: {e}"),
    }
}

fn row_json(
    line: u64,
    outcome: &RowOutcome,
) -> serde_json::Value {
    match outcome {
        RowOutcome::Estimated(result) => {
            serde_json::json!({ "line": line, "status": outcome.label(), "result": result })
        }
        RowOutcome::Invalid(invalid) => serde_json::json!({
            "line": line,
            "status": outcome.label(),
            "step": invalid.step_index + 1,
            "missing": invalid.missing,
        }),
        RowOutcome::Failed(e) => {
            serde_json::json!({ "line": line, "status": outcome.label(), "error": e.to_string() })
        }
    }
}
