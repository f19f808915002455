//! Lifecycle events emitted by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::core::PipelineStage;
use crate::errors::{PipelineError, StageFailure};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A run began.
    #[serde(rename = "pipeline.started")]
    PipelineStarted,
    /// A stage produced valid output.
    #[serde(rename = "stage.completed")]
    StageCompleted,
    /// A stage failed and the run is aborting.
    #[serde(rename = "stage.failed")]
    StageFailed,
    /// A run (or phase) finished successfully.
    #[serde(rename = "pipeline.completed")]
    PipelineCompleted,
    /// A run failed.
    #[serde(rename = "pipeline.failed")]
    PipelineFailed,
}

impl EventKind {
    /// The dotted event type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline.started",
            Self::StageCompleted => "stage.completed",
            Self::StageFailed => "stage.failed",
            Self::PipelineCompleted => "pipeline.completed",
            Self::PipelineFailed => "pipeline.failed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// The run it belongs to.
    pub run_id: Uuid,
    /// The stage, for stage events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Extra fields.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl PipelineEvent {
    /// Creates an event with no extra data.
    #[must_use]
    pub fn new(kind: EventKind, run_id: Uuid) -> Self {
        Self {
            kind,
            run_id,
            stage: None,
            timestamp: Utc::now(),
            data: Map::new(),
        }
    }

    /// Sets the stage.
    #[must_use]
    pub fn with_stage(mut self, stage: PipelineStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Adds a data field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// `pipeline.started`
    #[must_use]
    pub fn started(run_id: Uuid, first_stage: PipelineStage) -> Self {
        Self::new(EventKind::PipelineStarted, run_id).with_data("first_stage", json!(first_stage))
    }

    /// `stage.completed`
    #[must_use]
    pub fn stage_completed(
        run_id: Uuid,
        stage: PipelineStage,
        attempts: usize,
        duration_ms: f64,
    ) -> Self {
        Self::new(EventKind::StageCompleted, run_id)
            .with_stage(stage)
            .with_data("step", json!(stage.ordinal()))
            .with_data("attempts", json!(attempts))
            .with_data("duration_ms", json!(duration_ms))
    }

    /// `stage.failed`
    #[must_use]
    pub fn stage_failed(run_id: Uuid, stage: PipelineStage, failure: &StageFailure) -> Self {
        Self::new(EventKind::StageFailed, run_id)
            .with_stage(stage)
            .with_data("error_type", json!(failure.kind()))
            .with_data("error", json!(failure.to_string()))
    }

    /// `pipeline.completed`
    #[must_use]
    pub fn completed(run_id: Uuid, last_stage: PipelineStage, duration_ms: f64) -> Self {
        Self::new(EventKind::PipelineCompleted, run_id)
            .with_stage(last_stage)
            .with_data("duration_ms", json!(duration_ms))
    }

    /// `pipeline.failed`
    #[must_use]
    pub fn failed(error: &PipelineError) -> Self {
        Self::new(EventKind::PipelineFailed, error.run_id)
            .with_stage(error.stage)
            .with_data("error", Value::Object(error.to_dict()))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
