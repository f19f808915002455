//! Core domain model types for uxflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage identifiers and the run state machine
//! - Typed stage artifacts
//! - The input screenshot reference
//! - Run records persisted to the result store

mod artifact;
mod run;
mod screenshot;
mod status;

pub use artifact::{
    FeedbackReport, HeuristicEvaluation, JsonObject, StructuredArtifact, VisionAnalysis,
    WireframeArtifact,
};
pub use run::{
    EvaluationRecord, PipelineRun, StageAttempts, EVALUATION_ARTIFACT,
    FEEDBACK_MARKDOWN_ARTIFACT, RUN_ARTIFACT,
};
pub use screenshot::{ScreenshotMeta, ScreenshotRef};
pub use status::{PipelineStage, RunState};
