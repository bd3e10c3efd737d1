pub mod config;
pub mod detection;
pub mod error;
pub mod grading;
pub mod models;
pub mod pipeline;

pub use config::{LocatorParams, PipelineParams, SegmenterParams, load_answer_key};
pub use error::{GradeError, Result};
pub use models::{Answer, AnswerKey, Bubble, Choice, Contour, GradeReport, Quadrilateral};
pub use pipeline::{
    Artifact, ArtifactObserver, DebugDirObserver, GradingPipeline, NoopObserver, decode_image,
    open_image,
};
