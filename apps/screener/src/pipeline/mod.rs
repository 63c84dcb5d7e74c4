//! Screening pipeline — stage descriptors, dependency scheduler, coordinator.
//!
//! Flow: extract both documents → `cv_analysis` and `linkedin_analysis`
//! (independent, run concurrently) → `verification` (needs both) →
//! `final_decision` (needs `cv_analysis` + `verification`) → validated
//! `Verdict`.
//!
//! The stage graph is data, not control flow: a `PipelineDefinition` is an
//! immutable descriptor list validated at construction and executed by a
//! dependency-respecting wave scheduler. The reasoning itself is behind the
//! `AnalysisBackend` seam, so deterministic test doubles can drive every
//! scheduling and failure scenario.

pub mod context;
pub mod prompts;
pub mod verdict;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::{BackendError, PipelineError};
use crate::extract;
use crate::pairing::MatchedPair;

use self::context::AnalysisContext;
use self::verdict::Verdict;

/// The four stages of the screening pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageName {
    CvAnalysis,
    LinkedinAnalysis,
    Verification,
    FinalDecision,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::CvAnalysis => "cv_analysis",
            StageName::LinkedinAnalysis => "linkedin_analysis",
            StageName::Verification => "verification",
            StageName::FinalDecision => "final_decision",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage descriptor: its name and declared input dependencies.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: StageName,
    pub depends_on: &'static [StageName],
}

/// The immutable stage graph. Constructed once at process start and passed
/// by reference into the coordinator.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    stages: Vec<StageSpec>,
}

impl PipelineDefinition {
    /// The fixed screening graph. `final_decision` deliberately takes the
    /// verified synthesis, not the raw profile analysis.
    pub fn screening() -> Self {
        Self::new(vec![
            StageSpec {
                name: StageName::CvAnalysis,
                depends_on: &[],
            },
            StageSpec {
                name: StageName::LinkedinAnalysis,
                depends_on: &[],
            },
            StageSpec {
                name: StageName::Verification,
                depends_on: &[StageName::CvAnalysis, StageName::LinkedinAnalysis],
            },
            StageSpec {
                name: StageName::FinalDecision,
                depends_on: &[StageName::CvAnalysis, StageName::Verification],
            },
        ])
        .expect("screening stage graph is well-formed")
    }

    /// Validates the descriptor list: no duplicate names, and every
    /// dependency declared before its dependent — which also proves the
    /// graph acyclic. Malformed graphs fail here, never during a run.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self, PipelineError> {
        let mut declared: Vec<StageName> = Vec::with_capacity(stages.len());
        for spec in &stages {
            if declared.contains(&spec.name) {
                return Err(PipelineError::InvalidDefinition(format!(
                    "duplicate stage '{}'",
                    spec.name
                )));
            }
            for dep in spec.depends_on {
                if !declared.contains(dep) {
                    return Err(PipelineError::InvalidDefinition(format!(
                        "stage '{}' depends on '{dep}', which is not declared before it",
                        spec.name
                    )));
                }
            }
            declared.push(spec.name);
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }
}

/// The injected reasoning capability. The coordinator is agnostic to how a
/// completion is produced; production wires the Claude client in, tests
/// wire in scripted doubles.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn complete(
        &self,
        stage: StageName,
        system: &str,
        prompt: &str,
    ) -> Result<String, BackendError>;
}

/// Runs one candidate pair through the stage graph.
pub struct Coordinator<'a> {
    definition: &'a PipelineDefinition,
    backend: Arc<dyn AnalysisBackend>,
}

impl<'a> Coordinator<'a> {
    pub fn new(definition: &'a PipelineDefinition, backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            definition,
            backend,
        }
    }

    /// Runs the full pipeline for one matched pair and returns the
    /// validated verdict.
    ///
    /// Scheduling is wave-based: every stage whose dependencies are all in
    /// the context runs concurrently in the current wave; the next wave
    /// starts when the whole wave has landed. Extraction failures are
    /// rendered as prompt text (degraded evidence), never as errors; a
    /// backend failure or an invalid final output abandons the run with no
    /// partial verdict, and nothing is persisted.
    pub async fn run(
        &self,
        pair: &MatchedPair,
        job_description: &str,
    ) -> Result<Verdict, PipelineError> {
        let cv_text = extract_for_prompt(pair.cv.path.clone()).await;
        let profile_text = extract_for_prompt(pair.profile.path.clone()).await;

        let mut ctx = AnalysisContext::new();
        let mut remaining: Vec<&StageSpec> = self.definition.stages().iter().collect();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&StageSpec>, Vec<&StageSpec>) = remaining
                .into_iter()
                .partition(|spec| spec.depends_on.iter().all(|dep| ctx.contains(*dep)));
            debug_assert!(!ready.is_empty(), "definition validation guarantees progress");

            let mut wave = Vec::with_capacity(ready.len());
            for spec in ready {
                let stage = spec.name;
                let (system, prompt) =
                    stage_input(stage, &ctx, &cv_text, &profile_text, job_description);
                let backend = Arc::clone(&self.backend);
                wave.push((
                    stage,
                    tokio::spawn(async move { backend.complete(stage, &system, &prompt).await }),
                ));
            }

            for (stage, handle) in wave {
                let output = handle
                    .await
                    .map_err(|e| PipelineError::Stage {
                        stage,
                        source: BackendError(format!("stage task failed: {e}")),
                    })?
                    .map_err(|source| PipelineError::Stage { stage, source })?;
                debug!("stage '{stage}' completed ({} chars)", output.len());
                ctx.insert(stage, output);
            }

            remaining = blocked;
        }

        let verdict = Verdict::from_stage_output(ctx.require(StageName::FinalDecision))?;
        info!(
            "candidate '{}': verdict={} confidence={} matching={} discrepancies={}",
            pair.key,
            verdict.verdict,
            verdict.confidence_score,
            verdict.matching_score,
            verdict.discrepancies.len()
        );
        Ok(verdict)
    }
}

/// Builds the (system, user) prompt pair for one stage from the documents,
/// the job description, and the completed-dependency outputs.
fn stage_input(
    stage: StageName,
    ctx: &AnalysisContext,
    cv_text: &str,
    profile_text: &str,
    job_description: &str,
) -> (String, String) {
    match stage {
        StageName::CvAnalysis => (
            prompts::CV_ANALYSIS_SYSTEM.to_string(),
            prompts::render(
                prompts::CV_ANALYSIS_PROMPT,
                &[
                    ("{cv_text}", cv_text),
                    ("{job_description}", job_description),
                ],
            ),
        ),
        StageName::LinkedinAnalysis => (
            prompts::LINKEDIN_ANALYSIS_SYSTEM.to_string(),
            prompts::render(
                prompts::LINKEDIN_ANALYSIS_PROMPT,
                &[("{profile_text}", profile_text)],
            ),
        ),
        StageName::Verification => (
            prompts::VERIFICATION_SYSTEM.to_string(),
            prompts::render(
                prompts::VERIFICATION_PROMPT,
                &[
                    ("{cv_analysis}", ctx.require(StageName::CvAnalysis)),
                    (
                        "{linkedin_analysis}",
                        ctx.require(StageName::LinkedinAnalysis),
                    ),
                ],
            ),
        ),
        StageName::FinalDecision => (
            prompts::final_decision_system(),
            prompts::render(
                prompts::FINAL_DECISION_PROMPT,
                &[
                    ("{cv_analysis}", ctx.require(StageName::CvAnalysis)),
                    ("{verification}", ctx.require(StageName::Verification)),
                ],
            ),
        ),
    }
}

/// Extracts a document off the async path and renders the outcome as
/// prompt text. Extraction failures are evidence for the stage, not errors.
async fn extract_for_prompt(path: PathBuf) -> String {
    tokio::task::spawn_blocking(move || {
        let outcome = extract::extract(&path);
        outcome.into_prompt_text(&path)
    })
    .await
    .unwrap_or_else(|e| format!("Error: text extraction task failed: {e}"))
}
