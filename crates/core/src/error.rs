use fonttik_common::ProcessingError;
use thiserror::Error;

/// Failures of the concurrent analyse/render pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Render queue closed with {0} undrained frames")]
    Undrained(usize),

    #[error("Render queue accounting mismatch: pushed {pushed}, popped {popped}")]
    CountMismatch { pushed: usize, popped: usize },

    #[error("Render consumer stopped before the producer finished")]
    ConsumerClosed,

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl From<PipelineError> for ProcessingError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Processing(inner) => inner,
            other => ProcessingError::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_errors_pass_through() {
        let err: ProcessingError = PipelineError::Processing(ProcessingError::NoVideoStream).into();
        assert!(matches!(err, ProcessingError::NoVideoStream));

        let err: ProcessingError = PipelineError::CountMismatch {
            pushed: 3,
            popped: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Other error: Render queue accounting mismatch: pushed 3, popped 2"
        );
    }
}
