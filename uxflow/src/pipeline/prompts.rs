//! Stage prompt templates.
//!
//! Templates are plain text with `{placeholder}` slots filled by
//! [`PromptTemplates::render`]. The defaults can be replaced per stage.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::core::PipelineStage;

/// Slot for the stage 1 output.
pub const VISION_ANALYSIS_SLOT: &str = "{vision_analysis}";
/// Slot for the stage 2 output.
pub const HEURISTIC_EVALUATION_SLOT: &str = "{heuristic_evaluation}";
/// Slot for the stage 3 output.
pub const FEEDBACK_SLOT: &str = "{feedback}";
/// Slot for the heuristic catalogue.
pub const HEURISTICS_SLOT: &str = "{heuristics}";

/// One usability heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Heuristic {
    /// 1-based id.
    pub id: u8,
    /// Short name.
    pub name: &'static str,
    /// What the heuristic asks for.
    pub description: &'static str,
    /// How it applies on mobile.
    pub mobile_considerations: &'static str,
}

/// Nielsen's ten usability heuristics.
pub const NIELSEN_HEURISTICS: [Heuristic; 10] = [
    Heuristic {
        id: 1,
        name: "Visibility of system status",
        description: "The design should always keep users informed about what is going on, through appropriate feedback within a reasonable amount of time.",
        mobile_considerations: "Loading indicators, progress bars, active state indicators",
    },
    Heuristic {
        id: 2,
        name: "Match between system and the real world",
        description: "The design should speak the users' language. Use words, phrases, and concepts familiar to the user.",
        mobile_considerations: "Familiar icons, natural language, platform conventions",
    },
    Heuristic {
        id: 3,
        name: "User control and freedom",
        description: "Users need a clearly marked 'emergency exit' to leave unwanted actions without going through an extended process.",
        mobile_considerations: "Back buttons, cancel options, undo/redo, swipe gestures",
    },
    Heuristic {
        id: 4,
        name: "Consistency and standards",
        description: "Users should not have to wonder whether different words, situations, or actions mean the same thing.",
        mobile_considerations: "Platform design guidelines (iOS/Android), consistent navigation patterns",
    },
    Heuristic {
        id: 5,
        name: "Error prevention",
        description: "Good error messages are important, but preventing problems from occurring is even better.",
        mobile_considerations: "Input validation, confirmation dialogs, constraints, helpful defaults",
    },
    Heuristic {
        id: 6,
        name: "Recognition rather than recall",
        description: "Minimize the user's memory load by making elements, actions, and options visible.",
        mobile_considerations: "Visible navigation, clear labels, search history, recent items",
    },
    Heuristic {
        id: 7,
        name: "Flexibility and efficiency of use",
        description: "Shortcuts and accelerators may speed up interaction for expert users.",
        mobile_considerations: "Gestures, quick actions, shortcuts, personalization",
    },
    Heuristic {
        id: 8,
        name: "Aesthetic and minimalist design",
        description: "Interfaces should not contain information that is irrelevant or rarely needed.",
        mobile_considerations: "Progressive disclosure, prioritized content, clean layouts",
    },
    Heuristic {
        id: 9,
        name: "Help users recognize, diagnose, and recover from errors",
        description: "Error messages should be expressed in plain language, precisely indicate the problem, and constructively suggest a solution.",
        mobile_considerations: "Clear error messages, inline validation, recovery options",
    },
    Heuristic {
        id: 10,
        name: "Help and documentation",
        description: "It's best if the system doesn't need additional explanation. However, it may be necessary to provide documentation.",
        mobile_considerations: "Onboarding, tooltips, contextual help, FAQs",
    },
];

static HEURISTICS_JSON: LazyLock<String> = LazyLock::new(|| {
    serde_json::to_string_pretty(&NIELSEN_HEURISTICS).unwrap_or_else(|_| "[]".to_string())
});

const VISION_PROMPT: &str = r#"Analyze this mobile UI screenshot and extract detailed information.

Return ONLY valid JSON with this structure:

{
  "screen_type": "login/home/profile/list/etc",
  "components": [
    {"type": "button/text_input/image/label/icon/etc", "text": "visible text if any",
     "position": "top/middle/bottom/etc", "color": "describe color", "size": "small/medium/large"}
  ],
  "layout_structure": "describe overall layout",
  "color_scheme": {"primary_colors": [], "background": "", "text_colors": []},
  "typography": {"heading_sizes": "", "body_text_size": ""},
  "spacing_and_density": {"overall_density": "tight/comfortable/spacious", "element_spacing": ""},
  "accessibility_observations": [],
  "notable_patterns": []
}
"#;

const HEURISTICS_PROMPT: &str = r#"TASK: Evaluate this mobile UI against Nielsen's 10 Usability Heuristics.

UI ANALYSIS TO EVALUATE:
{vision_analysis}

HEURISTICS:
{heuristics}

For each heuristic, check whether the UI violates it, rate the severity
(high/medium/low), name the affected components and suggest an improvement.
Also list strengths where the UI follows best practice.

Return ONLY valid JSON with this structure:

{
  "violations": [
    {"heuristic_id": 1, "heuristic_name": "", "severity": "high/medium/low", "issue": "",
     "affected_components": [], "improvement_suggestion": "", "user_impact": ""}
  ],
  "strengths": [
    {"heuristic_id": 4, "heuristic_name": "", "observation": "", "components": []}
  ],
  "overall_score": 7.5,
  "summary": "Brief overall assessment"
}
"#;

const FEEDBACK_PROMPT: &str = r#"You are a developer-focused UX consultant. Turn these UX violations into clear, actionable feedback.

ORIGINAL UI ANALYSIS:
{vision_analysis}

IDENTIFIED VIOLATIONS:
{heuristic_evaluation}

For each violation give an action-oriented title, a priority (P0 critical, P1 high,
P2 medium, P3 low), why it matters, concrete implementation steps, wireframe
instructions and an effort estimate (quick-win, small, medium, large). Also list
quick wins: P1/P2 items with quick-win or small effort.

Return ONLY valid JSON (no markdown):

{
  "feedback_items": [
    {"id": 1, "title": "", "priority": "P1", "why_it_matters": "", "implementation_steps": [],
     "wireframe_instructions": "", "effort_estimate": "small", "related_heuristic": "",
     "affected_components": [], "technical_notes": ""}
  ],
  "quick_wins": [
    {"id": 3, "title": "", "impact": "", "effort": "quick-win", "priority": "P1"}
  ],
  "summary": {
    "total_issues": 0,
    "by_priority": {"P0": 0, "P1": 0, "P2": 0, "P3": 0},
    "by_effort": {"quick-win": 0, "small": 0, "medium": 0, "large": 0},
    "estimated_total_effort": ""
  },
  "implementation_order": []
}
"#;

const WIREFRAME_PROMPT: &str = r#"You are an expert UI/UX designer. Create an IMPROVED mobile UI wireframe in HTML/CSS.

## ORIGINAL DESIGN ANALYSIS:
{vision_analysis}

## IMPROVEMENTS TO IMPLEMENT:
{feedback}

Requirements:
1. Mobile-first: max-width 375px, centered on screen.
2. Implement every P0/P1 feedback item.
3. Keep the original app's identity and purpose.
4. Modern CSS: flexbox/grid, 16px padding, touch targets of at least 44px, WCAG AA contrast.
5. Show loading and error states, better labels and icons, improved spacing.
6. Add 3-5 small green "Fixed: [issue]" annotations on improved elements.
7. Use realistic content, not Lorem Ipsum.

Return ONLY a complete HTML document with embedded CSS, starting with <!DOCTYPE html>.
"#;

/// The four stage prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    /// Stage 1 prompt, sent with the screenshot.
    pub vision: String,
    /// Stage 2 prompt.
    pub heuristics: String,
    /// Stage 3 prompt.
    pub feedback: String,
    /// Stage 4 prompt.
    pub wireframe: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            vision: VISION_PROMPT.to_string(),
            heuristics: HEURISTICS_PROMPT.to_string(),
            feedback: FEEDBACK_PROMPT.to_string(),
            wireframe: WIREFRAME_PROMPT.to_string(),
        }
    }
}

/// Values available to a template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInputs<'a> {
    /// Stage 1 output as JSON text.
    pub vision_analysis: Option<&'a str>,
    /// Stage 2 output as JSON text.
    pub heuristic_evaluation: Option<&'a str>,
    /// Stage 3 output as JSON text.
    pub feedback: Option<&'a str>,
}

impl PromptTemplates {
    /// Creates the default templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the vision prompt.
    #[must_use]
    pub fn with_vision(mut self, template: impl Into<String>) -> Self {
        self.vision = template.into();
        self
    }

    /// Replaces the heuristics prompt.
    #[must_use]
    pub fn with_heuristics(mut self, template: impl Into<String>) -> Self {
        self.heuristics = template.into();
        self
    }

    /// Replaces the feedback prompt.
    #[must_use]
    pub fn with_feedback(mut self, template: impl Into<String>) -> Self {
        self.feedback = template.into();
        self
    }

    /// Replaces the wireframe prompt.
    #[must_use]
    pub fn with_wireframe(mut self, template: impl Into<String>) -> Self {
        self.wireframe = template.into();
        self
    }

    /// The raw template for a stage.
    #[must_use]
    pub fn template(&self, stage: PipelineStage) -> &str {
        match stage {
            PipelineStage::Vision => &self.vision,
            PipelineStage::Heuristics => &self.heuristics,
            PipelineStage::Feedback => &self.feedback,
            PipelineStage::Wireframe => &self.wireframe,
        }
    }

    /// Fills a stage template. Slots without a value are left untouched.
    ///
    /// The template is scanned once, so slot markers that appear inside an
    /// inserted value are copied through as text.
    #[must_use]
    pub fn render(&self, stage: PipelineStage, inputs: PromptInputs<'_>) -> String {
        let slots = [
            (HEURISTICS_SLOT, Some(HEURISTICS_JSON.as_str())),
            (VISION_ANALYSIS_SLOT, inputs.vision_analysis),
            (HEURISTIC_EVALUATION_SLOT, inputs.heuristic_evaluation),
            (FEEDBACK_SLOT, inputs.feedback),
        ];

        let template = self.template(stage);
        let mut prompt = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            prompt.push_str(&rest[..open]);
            rest = &rest[open..];

            let filled = slots.iter().find_map(|&(slot, value)| match value {
                Some(value) if rest.starts_with(slot) => Some((slot.len(), value)),
                _ => None,
            });
            match filled {
                Some((len, value)) => {
                    prompt.push_str(value);
                    rest = &rest[len..];
                }
                None => {
                    prompt.push('{');
                    rest = &rest[1..];
                }
            }
        }
        prompt.push_str(rest);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue() {
        assert_eq!(NIELSEN_HEURISTICS.len(), 10);
        for (idx, heuristic) in NIELSEN_HEURISTICS.iter().enumerate() {
            assert_eq!(usize::from(heuristic.id), idx + 1);
        }
        assert!(HEURISTICS_JSON.contains("\"mobile_considerations\""));
    }

    #[test]
    fn test_default_templates_have_slots() {
        let templates = PromptTemplates::default();
        assert!(templates.heuristics.contains(VISION_ANALYSIS_SLOT));
        assert!(templates.heuristics.contains(HEURISTICS_SLOT));
        assert!(templates.feedback.contains(VISION_ANALYSIS_SLOT));
        assert!(templates.feedback.contains(HEURISTIC_EVALUATION_SLOT));
        assert!(templates.wireframe.contains(VISION_ANALYSIS_SLOT));
        assert!(templates.wireframe.contains(FEEDBACK_SLOT));
    }

    #[test]
    fn test_render_fills_slots() {
        let templates = PromptTemplates::default();
        let prompt = templates.render(
            PipelineStage::Feedback,
            PromptInputs {
                vision_analysis: Some("{\"screen_type\": \"login\"}"),
                heuristic_evaluation: Some("{\"violations\": []}"),
                feedback: None,
            },
        );

        assert!(prompt.contains("{\"screen_type\": \"login\"}"));
        assert!(prompt.contains("{\"violations\": []}"));
        assert!(!prompt.contains(VISION_ANALYSIS_SLOT));
        assert!(!prompt.contains(HEURISTIC_EVALUATION_SLOT));
    }

    #[test]
    fn test_heuristics_catalogue_is_injected() {
        let prompt = PromptTemplates::default().render(
            PipelineStage::Heuristics,
            PromptInputs {
                vision_analysis: Some("{}"),
                ..PromptInputs::default()
            },
        );
        assert!(prompt.contains("Recognition rather than recall"));
        assert!(!prompt.contains(HEURISTICS_SLOT));
    }

    #[test]
    fn test_custom_template() {
        let templates = PromptTemplates::new().with_wireframe("V={vision_analysis} F={feedback}");
        let prompt = templates.render(
            PipelineStage::Wireframe,
            PromptInputs {
                vision_analysis: Some("a"),
                feedback: Some("b"),
                ..PromptInputs::default()
            },
        );
        assert_eq!(prompt, "V=a F=b");
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        let vision = "{\"note\": \"placeholder {heuristic_evaluation} shown\"}";
        let templates =
            PromptTemplates::new().with_feedback("V={vision_analysis}\nH={heuristic_evaluation}");
        let prompt = templates.render(
            PipelineStage::Feedback,
            PromptInputs {
                vision_analysis: Some(vision),
                heuristic_evaluation: Some("{\"violations\": []}"),
                feedback: None,
            },
        );

        assert_eq!(
            prompt,
            "V={\"note\": \"placeholder {heuristic_evaluation} shown\"}\nH={\"violations\": []}"
        );
        assert_eq!(prompt.matches("\"violations\"").count(), 1);
    }

    #[test]
    fn test_unfilled_slots_and_braces_are_kept() {
        let templates = PromptTemplates::new().with_wireframe("{ {feedback} {vision_analysis} }");
        let prompt = templates.render(
            PipelineStage::Wireframe,
            PromptInputs {
                vision_analysis: Some("v"),
                ..PromptInputs::default()
            },
        );
        assert_eq!(prompt, "{ {feedback} v }");
    }
}
