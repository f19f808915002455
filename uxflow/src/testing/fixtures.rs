//! Canned stage outputs and inputs.

use crate::core::ScreenshotRef;

use super::mocks::{RoutedModel, ScriptedModel};

/// Appears only in the vision fixture.
pub const VISION_MARKER: &str = "fixture-login-screen";
/// Appears only in the heuristics fixture.
pub const HEURISTICS_MARKER: &str = "fixture-heuristics-summary";
/// Appears only in the feedback fixture.
pub const FEEDBACK_MARKER: &str = "fixture-add-loading-indicator";

/// Vision stage output, fenced the way models usually answer.
pub const VISION_JSON: &str = r#"```json
{
  "screen_type": "fixture-login-screen",
  "components": [
    {"type": "text_input", "text": "Email", "position": "middle"},
    {"type": "button", "text": "Log in", "position": "bottom", "size": "small"}
  ],
  "layout_structure": "single column form"
}
```"#;

/// Heuristics stage output with leading chatter.
pub const HEURISTICS_JSON: &str = r#"Here is the evaluation:
{
  "violations": [
    {
      "heuristic_id": 1,
      "heuristic_name": "Visibility of system status",
      "severity": "high",
      "issue": "No feedback after tapping Log in",
      "affected_components": ["Log in button"]
    }
  ],
  "strengths": [],
  "overall_score": 6.5,
  "summary": "fixture-heuristics-summary"
}"#;

/// Feedback stage output.
pub const FEEDBACK_JSON: &str = r#"{
  "feedback_items": [
    {
      "id": 1,
      "title": "fixture-add-loading-indicator",
      "priority": "P1",
      "why_it_matters": "Users tap repeatedly when nothing happens",
      "implementation_steps": ["Track loading state", "Show a spinner"],
      "wireframe_instructions": "Show the button while loading",
      "effort_estimate": "small",
      "related_heuristic": "Visibility of system status"
    }
  ],
  "quick_wins": [],
  "summary": {
    "total_issues": 1,
    "by_priority": {"P0": 0, "P1": 1, "P2": 0, "P3": 0},
    "estimated_total_effort": "2 hours"
  },
  "implementation_order": ["1. Add the loading indicator"]
}"#;

/// Wireframe stage output.
pub const WIREFRAME_HTML: &str = "```html\n<!DOCTYPE html>\n<html lang=\"en\"><body><div class=\"mobile-frame\">Log in</div></body></html>\n```";

/// Markers that identify each default stage prompt.
pub const VISION_PROMPT_MARKER: &str = "Analyze this mobile UI screenshot";
/// See [`VISION_PROMPT_MARKER`].
pub const HEURISTICS_PROMPT_MARKER: &str = "Evaluate this mobile UI against Nielsen";
/// See [`VISION_PROMPT_MARKER`].
pub const FEEDBACK_PROMPT_MARKER: &str = "developer-focused UX consultant";
/// See [`VISION_PROMPT_MARKER`].
pub const WIREFRAME_PROMPT_MARKER: &str = "Create an IMPROVED mobile UI wireframe";

/// A small fake PNG screenshot.
#[must_use]
pub fn screenshot() -> ScreenshotRef {
    ScreenshotRef::from_bytes(
        vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
        "image/png",
    )
}

/// A model scripted for one successful four-stage run.
#[must_use]
pub fn happy_path_model() -> ScriptedModel {
    ScriptedModel::from_texts([VISION_JSON, HEURISTICS_JSON, FEEDBACK_JSON, WIREFRAME_HTML])
}

/// A model that answers every default stage prompt correctly, for any
/// number of concurrent runs.
#[must_use]
pub fn routed_model() -> RoutedModel {
    RoutedModel::new()
        .route(WIREFRAME_PROMPT_MARKER, Ok(WIREFRAME_HTML.to_string()))
        .route(FEEDBACK_PROMPT_MARKER, Ok(FEEDBACK_JSON.to_string()))
        .route(HEURISTICS_PROMPT_MARKER, Ok(HEURISTICS_JSON.to_string()))
        .route(VISION_PROMPT_MARKER, Ok(VISION_JSON.to_string()))
}
