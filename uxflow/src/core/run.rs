//! Run aggregates persisted to the result store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    FeedbackReport, HeuristicEvaluation, PipelineStage, ScreenshotMeta, VisionAnalysis,
    WireframeArtifact,
};

/// Artifact name of the phase-one evaluation record.
pub const EVALUATION_ARTIFACT: &str = "evaluation.json";

/// Artifact name of the combined run record.
pub const RUN_ARTIFACT: &str = "run.json";

/// Artifact name of the rendered feedback report.
pub const FEEDBACK_MARKDOWN_ARTIFACT: &str = "feedback.md";

/// Number of model calls each stage needed.
pub type StageAttempts = BTreeMap<PipelineStage, usize>;

/// Result of the first three stages.
///
/// Persisted between the evaluation and wireframe phases so the wireframe can
/// be generated by a later request that only knows the run id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The run this record belongs to.
    pub run_id: Uuid,
    /// When the run started.
    pub created_at: DateTime<Utc>,
    /// Input image summary.
    pub screenshot: ScreenshotMeta,
    /// Stage 1 output, kept so the wireframe preserves the original layout.
    pub original_analysis: VisionAnalysis,
    /// Stage 2 output.
    pub heuristics: HeuristicEvaluation,
    /// Stage 3 output.
    pub report: FeedbackReport,
    /// Model calls per completed stage.
    #[serde(default)]
    pub attempts: StageAttempts,
}

/// A fully populated run. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Generated run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub created_at: DateTime<Utc>,
    /// When the last stage completed.
    pub completed_at: DateTime<Utc>,
    /// Input image summary.
    pub screenshot: ScreenshotMeta,
    /// Stage 1 output.
    pub vision: VisionAnalysis,
    /// Stage 2 output.
    pub heuristics: HeuristicEvaluation,
    /// Stage 3 output.
    pub feedback: FeedbackReport,
    /// Stage 4 output.
    pub wireframe: WireframeArtifact,
    /// Model calls per stage.
    pub attempts: StageAttempts,
}

impl PipelineRun {
    /// Completes an evaluation with its wireframe.
    #[must_use]
    pub fn complete(
        evaluation: EvaluationRecord,
        wireframe: WireframeArtifact,
        wireframe_attempts: usize,
    ) -> Self {
        let mut attempts = evaluation.attempts;
        attempts.insert(PipelineStage::Wireframe, wireframe_attempts);

        Self {
            run_id: evaluation.run_id,
            created_at: evaluation.created_at,
            completed_at: Utc::now(),
            screenshot: evaluation.screenshot,
            vision: evaluation.original_analysis,
            heuristics: evaluation.heuristics,
            feedback: evaluation.report,
            wireframe,
            attempts,
        }
    }

    /// Total model calls across all stages.
    #[must_use]
    pub fn total_attempts(&self) -> usize {
        self.attempts.values().sum()
    }

    /// Run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.created_at).num_milliseconds()
    }
}
