use thiserror::Error;

/// Error taxonomy for the pipeline stages.
///
/// `Transient` is retried inside the generative call wrapper and surfaces to
/// the calling stage only after retries are exhausted. `Extraction` and
/// `Validation` are always absorbed at a stage boundary (score 0, dropped
/// item, or fallback script) and never reach the pipeline's caller.
/// `Configuration` is the one fatal kind: it means the fallback safety net
/// itself cannot be built.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transient call failure: {0}")]
    Transient(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }
}
