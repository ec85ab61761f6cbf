//! Markdown rendering for analysis results
//!
//! Every lookup tolerates missing keys and wrong types; absent data renders
//! as a sentinel instead of failing.

use serde_json::Value;

pub const NOT_FOUND: &str = "{data not found}";
pub const NOT_FOUND_ITEM: &str = "- {data not found}";

/// Render an analysis, or `None` when there is nothing to render.
pub fn render_markdown(analysis: Option<&Value>) -> Option<String> {
    analysis.map(render_analysis)
}

pub fn render_analysis(analysis: &Value) -> String {
    let mut out = String::new();

    out.push_str(&format!("## {}\n\n", text_field(analysis, "testTitle")));
    out.push_str(&format!("**Summary:** {}\n\n", text_field(analysis, "summary")));
    out.push_str(&format!("**Tags:** {}\n\n", tags_line(analysis)));

    out.push_str("### Functionalities Covered\n\n");
    out.push_str(&bullet_list(&string_items(analysis.get("functionalitiesCovered"))));
    out.push('\n');

    out.push_str("### Test Data Usage\n\n");
    out.push_str("| Category | Details |\n");
    out.push_str("|----------|---------|\n");
    let test_data = analysis.get("testData");
    for (label, key) in [
        ("Inputs", "inputs"),
        ("Mock Data", "mockData"),
        ("API Endpoints", "apiEndpoints"),
    ] {
        let items = string_items(test_data.and_then(|d| d.get(key)));
        let cell = if items.is_empty() {
            NOT_FOUND.to_string()
        } else {
            items.join(", ")
        };
        out.push_str(&format!("| {} | {} |\n", label, escape_cell(&cell)));
    }
    out.push('\n');

    out.push_str("### Steps & Verifications\n\n");
    out.push_str("| # | Step | Verification |\n");
    out.push_str("|---|------|--------------|\n");
    let steps: Vec<&Value> = analysis
        .get("steps")
        .and_then(Value::as_array)
        .map(|steps| steps.iter().collect())
        .unwrap_or_default();
    if steps.is_empty() {
        out.push_str(&format!("| - | {} | {} |\n", NOT_FOUND, NOT_FOUND));
    }
    for (idx, step) in steps.iter().enumerate() {
        let (action, verification) = match step {
            Value::String(s) => (s.clone(), NOT_FOUND.to_string()),
            other => (
                first_text(other, &["action", "step", "description"]),
                first_text(other, &["verification", "expected", "assertion"]),
            ),
        };
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            idx + 1,
            escape_cell(&action),
            escape_cell(&verification)
        ));
    }

    out
}

fn text_field(value: &Value, key: &str) -> String {
    first_text(value, &[key])
}

/// First non-empty string among `keys`, else the sentinel
fn first_text(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(scalar_text)
        .find(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => scalar_text(other)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

fn tags_line(analysis: &Value) -> String {
    let tags = string_items(analysis.get("tags"));
    if tags.is_empty() {
        return NOT_FOUND.to_string();
    }
    tags.iter()
        .map(|t| format!("`{}`", t))
        .collect::<Vec<_>>()
        .join(", ")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return format!("{}\n", NOT_FOUND_ITEM);
    }
    items.iter().map(|item| format!("- {}\n", item)).collect()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
