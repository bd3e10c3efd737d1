#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from bubblegrade for tests
pub use bubblegrade::{
    Answer, AnswerKey, Artifact, Choice, DebugDirObserver, GradeError, GradeReport,
    GradingPipeline,
};
