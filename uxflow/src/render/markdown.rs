//! Markdown rendering of a feedback report.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::Write;
use uuid::Uuid;

use crate::core::{FeedbackReport, JsonObject};

const MISSING: &str = "N/A";
const PRIORITIES: [(&str, &str); 4] = [
    ("P0", "Critical"),
    ("P1", "High"),
    ("P2", "Medium"),
    ("P3", "Low"),
];

fn priority_marker(priority: &str) -> &'static str {
    match priority {
        "P0" => "🔴",
        "P1" => "🟠",
        "P2" => "🟡",
        "P3" => "🟢",
        _ => "⚪",
    }
}

/// Text of a field, `N/A` when absent. Non-string scalars are stringified.
fn text<'a>(object: &'a JsonObject, key: &str) -> std::borrow::Cow<'a, str> {
    match object.get(key) {
        Some(Value::String(s)) => s.as_str().into(),
        Some(Value::Null) | None => MISSING.into(),
        Some(other) => other.to_string().into(),
    }
}

fn count(object: Option<&JsonObject>, key: &str) -> u64 {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Renders `report` as a Markdown document for developers.
#[must_use]
pub fn feedback_markdown(
    report: &FeedbackReport,
    run_id: Uuid,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut md, report, run_id, generated_at);
    md
}

fn write_report(
    md: &mut String,
    report: &FeedbackReport,
    run_id: Uuid,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    writeln!(md, "# UX Feedback Report\n")?;
    writeln!(md, "**Generated:** {}  ", generated_at.format("%B %d, %Y at %H:%M UTC"))?;
    writeln!(md, "**Run ID:** {run_id}\n\n---\n")?;

    if let Some(summary) = report.summary() {
        write_summary(md, report, summary)?;
    }

    let order = report.implementation_order();
    if !order.is_empty() {
        writeln!(md, "## Recommended Implementation Order\n")?;
        for step in order {
            writeln!(md, "{step}")?;
        }
        writeln!(md, "\n---\n")?;
    }

    let quick_wins: Vec<&JsonObject> = report.quick_wins().iter().filter_map(Value::as_object).collect();
    if !quick_wins.is_empty() {
        writeln!(md, "## Quick Wins\n\nEasy changes with high impact:\n")?;
        for win in quick_wins {
            writeln!(md, "### {}\n", title(win))?;
            writeln!(md, "**Priority:** {}  ", text(win, "priority"))?;
            writeln!(md, "**Effort:** {}  ", text(win, "effort"))?;
            writeln!(md, "**Impact:** {}\n", text(win, "impact"))?;
        }
        writeln!(md, "---\n")?;
    }

    let items: Vec<&JsonObject> = report.feedback_items().iter().filter_map(Value::as_object).collect();
    if !items.is_empty() {
        writeln!(md, "## Detailed Feedback\n")?;
        for item in items {
            write_item(md, item)?;
        }
    }

    Ok(())
}

fn title(object: &JsonObject) -> &str {
    object
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled")
}

fn write_summary(md: &mut String, report: &FeedbackReport, summary: &JsonObject) -> std::fmt::Result {
    let by_priority = summary.get("by_priority").and_then(Value::as_object);

    writeln!(md, "## Summary\n")?;
    writeln!(md, "| Metric | Count |")?;
    writeln!(md, "|--------|-------|")?;
    writeln!(md, "| **Total Issues** | {} |", report.total_issues())?;
    for (priority, label) in PRIORITIES {
        writeln!(
            md,
            "| **{label} ({priority})** | {} {} |",
            priority_marker(priority),
            count(by_priority, priority)
        )?;
    }
    writeln!(
        md,
        "| **Estimated Effort** | {} |\n\n---\n",
        text(summary, "estimated_total_effort")
    )
}

fn write_item(md: &mut String, item: &JsonObject) -> std::fmt::Result {
    let priority = item.get("priority").and_then(Value::as_str).unwrap_or("P3");

    writeln!(md, "### {} {}\n", priority_marker(priority), title(item))?;
    writeln!(
        md,
        "**Priority:** {priority} | **Effort:** {} | **Heuristic:** {}\n",
        text(item, "effort_estimate"),
        text(item, "related_heuristic")
    )?;
    writeln!(md, "#### Why It Matters\n{}\n", text(item, "why_it_matters"))?;

    writeln!(md, "#### Implementation Steps")?;
    let steps = item
        .get("implementation_steps")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if steps.is_empty() {
        writeln!(md, "{MISSING}")?;
    }
    for (idx, step) in steps.iter().enumerate() {
        match step.as_str() {
            Some(s) => writeln!(md, "{}. {s}", idx + 1)?,
            None => writeln!(md, "{}. {step}", idx + 1)?,
        }
    }

    writeln!(
        md,
        "\n#### Wireframe Instructions\n{}\n",
        text(item, "wireframe_instructions")
    )?;

    if item.get("technical_notes").is_some_and(|v| !v.is_null()) {
        writeln!(
            md,
            "#### Technical Notes\n```\n{}\n```\n",
            text(item, "technical_notes")
        )?;
    }

    writeln!(md, "---\n")
}
