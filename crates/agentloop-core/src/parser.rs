//! Extraction of JSON objects embedded in free-text model output.
//!
//! Models rarely return bare JSON. They wrap it in prose, code fences or
//! trailing commentary. [`extract_first_json`] pulls out the first `{...}` span
//! and parses it; [`ResponseParser`] lets the engine swap in a stricter
//! extractor without changing any role code.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::error::ParseError;

/// A JSON object as returned by the parser.
pub type JsonObject = Map<String, Value>;

/// Strategy for turning raw model text into a JSON object.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<JsonObject, ParseError>;
}

/// Non-greedy extractor: the span from the first `{` to the first `}` after it.
///
/// Nested objects are cut short at the first inner `}` and then fail to parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstJsonParser;

impl ResponseParser for FirstJsonParser {
    fn parse(&self, text: &str) -> Result<JsonObject, ParseError> {
        extract_first_json(text)
    }
}

/// Bracket-balancing extractor that understands string literals and escapes,
/// so nested objects and braces inside strings are handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedJsonParser;

impl ResponseParser for BalancedJsonParser {
    fn parse(&self, text: &str) -> Result<JsonObject, ParseError> {
        let result = match balanced_span(text) {
            Some(Ok(span)) => decode_object(span),
            Some(Err(unterminated)) => Err(ParseError::MalformedJson {
                message: "unterminated JSON object".to_string(),
                fragment: unterminated.to_string(),
            }),
            None => Err(ParseError::NoJsonFound),
        };
        result.map_err(|err| report_failure(err, text))
    }
}

fn first_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*?\}").expect("static regex is valid"))
}

/// Parse the first `{...}` span found in `text`.
///
/// Fails with [`ParseError::NoJsonFound`] when there is no span and
/// [`ParseError::MalformedJson`] when the span is not valid JSON. Failures are
/// logged together with the raw text before being returned.
pub fn extract_first_json(text: &str) -> Result<JsonObject, ParseError> {
    let result = match first_object_pattern().find(text) {
        Some(m) => decode_object(m.as_str()),
        None => Err(ParseError::NoJsonFound),
    };
    result.map_err(|err| report_failure(err, text))
}

fn decode_object(span: &str) -> Result<JsonObject, ParseError> {
    serde_json::from_str::<JsonObject>(span).map_err(|e| ParseError::MalformedJson {
        message: e.to_string(),
        fragment: span.to_string(),
    })
}

fn report_failure(err: ParseError, raw: &str) -> ParseError {
    warn!(event = "parser.failed", error = %err, raw = %raw, "JSON parse error");
    err
}

/// Locate the first balanced `{...}` span.
///
/// Returns `None` if there is no `{`, `Some(Err(rest))` if the object never
/// closes.
fn balanced_span(text: &str) -> Option<Result<&str, &str>> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(Ok(&text[start..end]));
                }
            }
            _ => {}
        }
    }
    Some(Err(&text[start..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_object_surrounded_by_prose() {
        let text = r#"Here you go: {"tags": ["a","b","c"], "summary": "short"} trailing text"#;
        let obj = extract_first_json(text).unwrap();
        assert_eq!(
            Value::Object(obj),
            json!({"tags": ["a", "b", "c"], "summary": "short"})
        );
    }

    #[test]
    fn test_match_spans_newlines() {
        let text = "```json\n{\n  \"summary\": \"multi\nline\"\n}\n```";
        // The literal newline inside the string is invalid JSON, but the span
        // must still be found across lines.
        let err = extract_first_json(text).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson { .. }));

        let text = "{\n  \"summary\": \"ok\"\n}";
        let obj = extract_first_json(text).unwrap();
        assert_eq!(obj["summary"], "ok");
    }

    #[test]
    fn test_first_of_several_objects_wins() {
        let text = r#"{"a": 1} and then {"b": 2}"#;
        let obj = extract_first_json(text).unwrap();
        assert_eq!(obj.get("a"), Some(&json!(1)));
        assert!(obj.get("b").is_none());
    }

    #[test]
    fn test_no_braces_is_no_json_found() {
        let err = extract_first_json("the model refused to answer").unwrap_err();
        assert_eq!(err, ParseError::NoJsonFound);
    }

    #[test]
    fn test_unclosed_brace_is_no_json_found() {
        let err = extract_first_json(r#"{"tags": ["a""#).unwrap_err();
        assert_eq!(err, ParseError::NoJsonFound);
    }

    #[test]
    fn test_invalid_span_is_malformed() {
        let err = extract_first_json(r#"{"tags": [1,2,}"#).unwrap_err();
        match err {
            ParseError::MalformedJson { fragment, .. } => {
                assert_eq!(fragment, r#"{"tags": [1,2,}"#)
            }
            other => panic!("Expected MalformedJson, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_object_is_truncated_by_first_parser() {
        let text = r#"{"meta": {"k": 1}, "summary": "s"}"#;
        let err = FirstJsonParser.parse(text).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson { .. }));
    }

    #[test]
    fn test_balanced_parser_handles_nested_object() {
        let text = r#"result: {"meta": {"k": 1}, "summary": "s"} done"#;
        let obj = BalancedJsonParser.parse(text).unwrap();
        assert_eq!(obj["meta"], json!({"k": 1}));
        assert_eq!(obj["summary"], "s");
    }

    #[test]
    fn test_balanced_parser_ignores_braces_in_strings() {
        let text = r#"{"summary": "use } and { freely \" ok"}"#;
        let obj = BalancedJsonParser.parse(text).unwrap();
        assert_eq!(obj["summary"], "use } and { freely \" ok");
    }

    #[test]
    fn test_balanced_parser_errors() {
        assert_eq!(
            BalancedJsonParser.parse("nothing here").unwrap_err(),
            ParseError::NoJsonFound
        );
        assert!(matches!(
            BalancedJsonParser.parse(r#"{"a": {"b": 1}"#).unwrap_err(),
            ParseError::MalformedJson { .. }
        ));
    }
}
