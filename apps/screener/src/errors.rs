use thiserror::Error;

use crate::pipeline::StageName;

/// Failure reported by an analysis backend for a single stage call.
///
/// The coordinator is agnostic to the backend implementation, so the cause
/// is carried as a rendered message rather than a backend-specific type.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Unrecoverable failure of one candidate's pipeline run.
///
/// A `PipelineError` abandons that candidate only; the batch moves on to the
/// next candidate. No partial verdict is ever returned alongside one.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stage graph itself is malformed. Raised at construction time,
    /// never during a run.
    #[error("invalid pipeline definition: {0}")]
    InvalidDefinition(String),

    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: StageName,
        #[source]
        source: BackendError,
    },

    /// The final decision stage produced output that does not satisfy the
    /// verdict schema. Never coerced or clamped into a verdict.
    #[error("final decision violated the verdict schema: {detail}")]
    SchemaViolation { detail: String },
}

/// Failure of the tracking-system write path for one candidate.
///
/// Caught and logged at the call site; never aborts the batch.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Odoo authentication failed: invalid credentials or database")]
    Auth,

    /// No `hr.job` record matches the configured position name. Fails
    /// closed: no applicant record is created.
    #[error("job position '{0}' not found")]
    PositionNotFound(String),

    #[error("failed to read CV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("tracking-system write failed: {0}")]
    Write(String),
}
