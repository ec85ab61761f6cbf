use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static JSON_SPAN: OnceLock<Regex> = OnceLock::new();

/// Greedy: from the first `{` to the last `}` in the content.
fn json_span() -> &'static Regex {
    JSON_SPAN.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("JSON span pattern is valid"))
}

/// Pull a JSON object out of free-form model output.
///
/// When no brace span exists the whole content is parsed, so a bare JSON
/// scalar or array still comes through.
pub fn extract_json(content: &str) -> Result<Value, serde_json::Error> {
    let candidate = json_span()
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content);
    serde_json::from_str(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_from_surrounding_prose() {
        let value = extract_json("Here is the result: {\"testTitle\":\"X\"} Thanks!").unwrap();
        assert_eq!(value, json!({"testTitle": "X"}));
    }

    #[test]
    fn test_extract_json_keeps_nested_objects() {
        let content = "```json\n{\"steps\":[{\"action\":\"open\"}],\"testData\":{\"inputs\":[]}}\n```";
        let value = extract_json(content).unwrap();
        assert_eq!(value["steps"][0]["action"], "open");
    }

    #[test]
    fn test_extract_json_falls_back_to_whole_content() {
        assert_eq!(extract_json("[1, 2]").unwrap(), json!([1, 2]));
        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn test_greedy_span_fails_on_two_separate_objects() {
        // first `{` to last `}` swallows the prose between them
        assert!(extract_json("{\"a\":1} and also {\"b\":2}").is_err());
    }
}
