use thiserror::Error;

/// Hook execution errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ObserverError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Pipeline execution failed: {0}")]
    PipelineError(String),
}
