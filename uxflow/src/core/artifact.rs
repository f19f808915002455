//! Typed stage artifacts.
//!
//! Structured artifacts are thin wrappers over a JSON object produced by the
//! model. The wrapper fixes which stage the object came from, so a heuristic
//! evaluation can never be threaded into a slot expecting a vision analysis.
//! Unknown fields are kept as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PipelineStage;

/// A JSON object as returned by the extractor.
pub type JsonObject = serde_json::Map<String, Value>;

/// Common behaviour of the JSON-backed stage artifacts.
pub trait StructuredArtifact: Sized {
    /// The stage that produces this artifact.
    const STAGE: PipelineStage;

    /// Wraps a parsed object.
    fn from_object(object: JsonObject) -> Self;

    /// Borrows the underlying object.
    fn as_object(&self) -> &JsonObject;

    /// Looks up a top-level field.
    fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().get(key)
    }

    /// Renders the artifact as pretty-printed JSON.
    fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self.as_object()).unwrap_or_else(|_| "{}".to_string())
    }
}

fn array_field<'a>(object: &'a JsonObject, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Stage 1 output: components, layout, colors and typography of the screen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisionAnalysis(JsonObject);

impl StructuredArtifact for VisionAnalysis {
    const STAGE: PipelineStage = PipelineStage::Vision;

    fn from_object(object: JsonObject) -> Self {
        Self(object)
    }

    fn as_object(&self) -> &JsonObject {
        &self.0
    }
}

impl VisionAnalysis {
    /// Detected screen type (login, home, ...).
    #[must_use]
    pub fn screen_type(&self) -> Option<&str> {
        self.0.get("screen_type").and_then(Value::as_str)
    }

    /// Detected UI components.
    #[must_use]
    pub fn components(&self) -> &[Value] {
        array_field(&self.0, "components")
    }

    /// Free-form layout description.
    #[must_use]
    pub fn layout_structure(&self) -> Option<&str> {
        self.0.get("layout_structure").and_then(Value::as_str)
    }
}

/// Stage 2 output: heuristic violations, strengths and an overall score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeuristicEvaluation(JsonObject);

impl StructuredArtifact for HeuristicEvaluation {
    const STAGE: PipelineStage = PipelineStage::Heuristics;

    fn from_object(object: JsonObject) -> Self {
        Self(object)
    }

    fn as_object(&self) -> &JsonObject {
        &self.0
    }
}

impl HeuristicEvaluation {
    /// Heuristic violations.
    #[must_use]
    pub fn violations(&self) -> &[Value] {
        array_field(&self.0, "violations")
    }

    /// Things the design does well.
    #[must_use]
    pub fn strengths(&self) -> &[Value] {
        array_field(&self.0, "strengths")
    }

    /// The overall usability score, if the model provided a number.
    #[must_use]
    pub fn overall_score(&self) -> Option<f64> {
        self.0.get("overall_score").and_then(Value::as_f64)
    }

    /// Short overall assessment.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.0.get("summary").and_then(Value::as_str)
    }
}

/// Stage 3 output: actionable feedback items, quick wins and a summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackReport(JsonObject);

impl StructuredArtifact for FeedbackReport {
    const STAGE: PipelineStage = PipelineStage::Feedback;

    fn from_object(object: JsonObject) -> Self {
        Self(object)
    }

    fn as_object(&self) -> &JsonObject {
        &self.0
    }
}

impl FeedbackReport {
    /// Detailed feedback items.
    #[must_use]
    pub fn feedback_items(&self) -> &[Value] {
        array_field(&self.0, "feedback_items")
    }

    /// High-impact, low-effort items.
    #[must_use]
    pub fn quick_wins(&self) -> &[Value] {
        array_field(&self.0, "quick_wins")
    }

    /// The summary block.
    #[must_use]
    pub fn summary(&self) -> Option<&JsonObject> {
        self.0.get("summary").and_then(Value::as_object)
    }

    /// Total issue count: the summary's figure, else the number of items.
    #[must_use]
    pub fn total_issues(&self) -> u64 {
        self.summary()
            .and_then(|s| s.get("total_issues"))
            .and_then(Value::as_u64)
            .unwrap_or(self.feedback_items().len() as u64)
    }

    /// Recommended implementation order, skipping non-string entries.
    #[must_use]
    pub fn implementation_order(&self) -> Vec<&str> {
        array_field(&self.0, "implementation_order")
            .iter()
            .filter_map(Value::as_str)
            .collect()
    }
}

/// Stage 4 output: a standalone HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireframeArtifact(String);

impl WireframeArtifact {
    /// Wraps an HTML document.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Borrows the HTML.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.0
    }

    /// Consumes the artifact, returning the HTML.
    #[must_use]
    pub fn into_html(self) -> String {
        self.0
    }

    /// Size of the document in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an empty document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
