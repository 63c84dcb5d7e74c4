mod config;
mod errors;
mod extract;
mod llm_client;
mod pairing;
mod pipeline;
mod sink;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmBackend, LlmClient};
use crate::pairing::{CandidateKey, MatchedPair};
use crate::pipeline::verdict::Decision;
use crate::pipeline::{AnalysisBackend, Coordinator, PipelineDefinition};
use crate::sink::{OdooSink, ResultSink};

/// Batch CV screening: pair CVs with LinkedIn profile exports, run each
/// matched candidate through the analysis pipeline, and upload terminal
/// verdicts to Odoo recruitment.
#[derive(Debug, Parser)]
#[command(name = "screener", about, version)]
struct Cli {
    /// Directory containing candidate CV PDFs
    cv_dir: PathBuf,
    /// Directory containing LinkedIn profile PDF exports
    profile_dir: PathBuf,
    /// Free-text job description the candidates are screened against
    job_description: String,
}

/// Per-batch outcome counts, logged once at the end of the run.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchSummary {
    selected: usize,
    rejected: usize,
    no_action: usize,
    pipeline_failures: usize,
    sink_failures: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    let pairs = pairing::match_directories(&cli.cv_dir, &cli.profile_dir)
        .context("failed to scan input directories")?;
    info!("Total matched candidates: {}", pairs.len());

    let definition = PipelineDefinition::screening();
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let backend: Arc<dyn AnalysisBackend> =
        Arc::new(LlmBackend::new(llm, config.llm_concurrency));
    let coordinator = Coordinator::new(&definition, backend);

    // Connect before the first pipeline run: a batch that cannot persist
    // anything should fail up front, not after burning LLM calls.
    let sink = OdooSink::connect(&config).await?;

    let summary = run_batch(&coordinator, &sink, &pairs, &cli.job_description).await;
    info!(
        "batch complete: {} selected, {} rejected, {} no action, {} pipeline failures, {} upload failures",
        summary.selected,
        summary.rejected,
        summary.no_action,
        summary.pipeline_failures,
        summary.sink_failures,
    );

    Ok(())
}

/// Processes every matched candidate in key order. Per-candidate failures
/// are logged with the candidate identity and never abort the batch; the
/// sink is invoked exactly once per terminal verdict and never for a
/// failed run.
async fn run_batch(
    coordinator: &Coordinator<'_>,
    sink: &dyn ResultSink,
    pairs: &BTreeMap<CandidateKey, MatchedPair>,
    job_description: &str,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (key, pair) in pairs {
        info!(
            "screening candidate '{key}' (cv: {}, profile: {})",
            pair.cv.path.display(),
            pair.profile.path.display()
        );

        let verdict = match coordinator.run(pair, job_description).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("candidate '{key}': pipeline failed: {e}");
                summary.pipeline_failures += 1;
                continue;
            }
        };

        match &verdict.verdict {
            Decision::Select => summary.selected += 1,
            Decision::Reject => summary.rejected += 1,
            Decision::Other(raw) => {
                info!("candidate '{key}': no action for verdict '{raw}'");
                summary.no_action += 1;
            }
        }

        if !verdict.verdict.is_terminal() {
            continue;
        }

        match sink.persist(key.as_str(), &pair.cv.path, &verdict).await {
            Ok(applicant_id) => {
                info!("candidate '{key}': uploaded as applicant {applicant_id}");
            }
            Err(e) => {
                error!("candidate '{key}': upload failed: {e}");
                summary.sink_failures += 1;
            }
        }
    }

    summary
}
