//! Best-effort JSON recovery from free-form model output.

use serde_json::Value;

/// Parses `text` as JSON, or failing that the slice from the first `{`/`[` to
/// the last `}`/`]`. Returns `None` when neither parses.
///
/// No bracket balancing is attempted. When the text holds several JSON
/// values the outermost slice is the only candidate, so it either parses as a
/// whole or the result is `None`.
pub fn normalize(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let slice = candidate_slice(trimmed)?;
    match serde_json::from_str::<Value>(slice) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(
                "Could not recover JSON from model output ({}): {}",
                e,
                trimmed.chars().take(200).collect::<String>()
            );
            None
        }
    }
}

fn candidate_slice(text: &str) -> Option<&str> {
    let start = match (text.find('{'), text.find('[')) {
        (Some(brace), Some(bracket)) => brace.min(bracket),
        (Some(pos), None) | (None, Some(pos)) => pos,
        (None, None) => return None,
    };
    let end = match (text.rfind('}'), text.rfind(']')) {
        (Some(brace), Some(bracket)) => brace.max(bracket),
        (Some(pos), None) | (None, Some(pos)) => pos,
        (None, None) => return None,
    };

    // Both delimiters are single-byte ASCII, so `end + 1` stays on a char boundary.
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_json() {
        let payload = json!({"lessons": [{"title": "Budgeting", "points": 100}], "ok": true});
        assert_eq!(normalize(&payload.to_string()), Some(payload));
    }

    #[test]
    fn recovers_object_from_surrounding_prose() {
        let text = "here is the result: {\"a\":1} thanks";
        assert_eq!(normalize(text), Some(json!({"a": 1})));
    }

    #[test]
    fn recovers_from_markdown_fence() {
        let text = "```json\n[{\"title\": \"Gig work\"}]\n```";
        assert_eq!(normalize(text), Some(json!([{"title": "Gig work"}])));
    }

    #[test]
    fn earliest_opening_delimiter_wins() {
        let text = "Sure! [1, 2, {\"x\": 3}] done";
        assert_eq!(normalize(text), Some(json!([1, 2, {"x": 3}])));
    }

    #[test]
    fn empty_and_plain_text_are_absent() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   \n"), None);
        assert_eq!(normalize("not json at all"), None);
    }

    #[test]
    fn closing_before_opening_is_absent() {
        assert_eq!(normalize("} oops {"), None);
    }

    #[test]
    fn unbalanced_slice_falls_through() {
        assert_eq!(normalize("result: {\"a\": [1, 2} trailing"), None);
    }

    #[test]
    fn multiple_objects_are_not_split() {
        // The outer slice spans both objects and is not valid JSON on its own.
        assert_eq!(normalize("first {\"a\":1} then {\"b\":2}"), None);
    }

    #[test]
    fn bare_scalars_still_parse() {
        assert_eq!(normalize("42"), Some(json!(42)));
        assert_eq!(normalize("\"text\""), Some(json!("text")));
    }
}
