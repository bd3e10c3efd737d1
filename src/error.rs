use thiserror::Error;

/// Errors that abort a grading run.
///
/// Per-question problems are not errors; they surface as
/// [`Answer::Unanswered`](crate::models::Answer::Unanswered) in the report.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("could not read image: {0}")]
    InvalidImage(String),

    #[error("no answer sheet document found in image")]
    DocumentNotFound,

    #[error("no answer bubbles found in the image")]
    NoBubblesFound,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write debug artifact: {0}")]
    Artifact(String),
}

pub type Result<T> = std::result::Result<T, GradeError>;
