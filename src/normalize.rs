use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```(?:json)?\r?\n?").expect("leading fence regex"));
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n?```$").expect("trailing fence regex"));

/// Strips a stray markdown code fence from a model response so the result
/// can be treated as JSON text. Idempotent; does not validate the JSON.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = LEADING_FENCE.replace(trimmed, "");
    let stripped = TRAILING_FENCE.replace(&stripped, "");
    stripped.trim().to_string()
}

/// Pretty-prints JSON text for display or the clipboard. Falls back to the
/// input unchanged when it does not parse.
pub fn pretty(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_json_fence() {
        let wrapped = "```json\n{\"subjects\":[\"cat\"]}\n```";
        assert_eq!(normalize(wrapped), "{\"subjects\":[\"cat\"]}");
    }

    #[test]
    fn test_normalize_strips_bare_fence() {
        let wrapped = "```\n{\"a\":1}\n```";
        assert_eq!(normalize(wrapped), "{\"a\":1}");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize("  {\"a\":1}  \n"), "{\"a\":1}");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let clean = "{\"subjects\":[\"cat\"],\"mood\":\"calm\"}";
        let once = normalize(clean);
        assert_eq!(once, clean);
        assert_eq!(normalize(&once), once);

        let wrapped = "```json\n{\"a\":\"b\"}\n```";
        let once = normalize(wrapped);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_leaves_inner_backticks_alone() {
        let s = "{\"code\":\"use ``` sparingly\"}";
        assert_eq!(normalize(s), s);
    }

    #[test]
    fn test_pretty_formats_valid_json() {
        let pretty_text = pretty("{\"a\":1}");
        assert!(pretty_text.contains("\"a\": 1"));
        assert!(pretty_text.contains('\n'));
    }

    #[test]
    fn test_pretty_falls_back_on_invalid_json() {
        let garbage = "the model said something that is not JSON";
        assert_eq!(pretty(garbage), garbage);
    }
}
