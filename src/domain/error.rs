// Failure taxonomy of the refresh pipeline

/// Everything that can go wrong between a trigger and a published artifact.
///
/// None of these are fatal: the refresh worker degrades each of them to a
/// placeholder artifact on the affected panel.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("render failure: {0}")]
    RenderFailure(String),
}

impl PipelineError {
    /// Short, user-facing label for placeholder artifacts
    pub fn headline(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable(_) => "Data source unavailable",
            PipelineError::RateLimited(_) => "Data source quota exceeded",
            PipelineError::InvalidResponse(_) => "Unexpected data from source",
            PipelineError::RenderFailure(_) => "Panel could not be rendered",
        }
    }
}
