//! Pipeline stage identifiers and the run state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four ordered pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Screenshot analysis by a vision model.
    Vision,
    /// Evaluation of the analysis against usability heuristics.
    Heuristics,
    /// Developer-facing feedback generation.
    Feedback,
    /// Improved HTML wireframe synthesis.
    Wireframe,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [Self; 4] = [Self::Vision, Self::Heuristics, Self::Feedback, Self::Wireframe];

    /// Returns the 1-based step index used in progress notifications.
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Vision => 1,
            Self::Heuristics => 2,
            Self::Feedback => 3,
            Self::Wireframe => 4,
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vision => "vision",
            Self::Heuristics => "heuristics",
            Self::Feedback => "feedback",
            Self::Wireframe => "wireframe",
        }
    }

    /// Returns the name under which the stage's output is persisted.
    #[must_use]
    pub fn artifact_name(self) -> &'static str {
        match self {
            Self::Vision => "vision_analysis.json",
            Self::Heuristics => "heuristic_evaluation.json",
            Self::Feedback => "feedback.json",
            Self::Wireframe => "wireframe.html",
        }
    }

    /// Human-readable progress message sent when the stage completes.
    #[must_use]
    pub fn progress_message(self) -> &'static str {
        match self {
            Self::Vision => "Screenshot analyzed",
            Self::Heuristics => "Heuristic evaluation complete",
            Self::Feedback => "Feedback report generated",
            Self::Wireframe => "Wireframe generated",
        }
    }

    /// Returns the stage that runs after this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Vision => Some(Self::Heuristics),
            Self::Heuristics => Some(Self::Feedback),
            Self::Feedback => Some(Self::Wireframe),
            Self::Wireframe => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of a single pipeline run.
///
/// `Init → VisionDone → HeuristicsDone → FeedbackDone → WireframeDone`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// No stage has completed yet.
    #[default]
    Init,
    /// Vision analysis parsed.
    VisionDone,
    /// Heuristic evaluation parsed.
    HeuristicsDone,
    /// Feedback report parsed.
    FeedbackDone,
    /// Wireframe produced. Terminal success.
    WireframeDone,
    /// A stage failed. Terminal failure.
    Failed {
        /// The stage that failed.
        stage: PipelineStage,
        /// Why it failed.
        reason: String,
    },
}

impl RunState {
    /// The state reached once `stage` has completed.
    #[must_use]
    pub fn after(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Vision => Self::VisionDone,
            PipelineStage::Heuristics => Self::HeuristicsDone,
            PipelineStage::Feedback => Self::FeedbackDone,
            PipelineStage::Wireframe => Self::WireframeDone,
        }
    }

    /// The stage allowed to run from this state, if any.
    #[must_use]
    pub fn next_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Init => Some(PipelineStage::Vision),
            Self::VisionDone => Some(PipelineStage::Heuristics),
            Self::HeuristicsDone => Some(PipelineStage::Feedback),
            Self::FeedbackDone => Some(PipelineStage::Wireframe),
            Self::WireframeDone | Self::Failed { .. } => None,
        }
    }

    /// Advances past `stage`.
    ///
    /// Returns `None` if `stage` is not the next stage for this state.
    #[must_use]
    pub fn advance(&self, stage: PipelineStage) -> Option<Self> {
        (self.next_stage() == Some(stage)).then(|| Self::after(stage))
    }

    /// Returns true for `WireframeDone` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WireframeDone | Self::Failed { .. })
    }

    /// Returns true if the run failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::VisionDone => write!(f, "vision_done"),
            Self::HeuristicsDone => write!(f, "heuristics_done"),
            Self::FeedbackDone => write!(f, "feedback_done"),
            Self::WireframeDone => write!(f, "wireframe_done"),
            Self::Failed { stage, .. } => write!(f, "failed({stage})"),
        }
    }
}
