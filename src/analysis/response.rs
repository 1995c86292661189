//! Completion response parsing and repair.
//!
//! Models are asked for a bare JSON object but do not always comply. The
//! parser tolerates surrounding prose, fills in missing fields, clamps the
//! confidence, and falls back to a fixed diagnosis when nothing parses.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::json_path::{value_to_int, value_to_string};

/// Suggested fix used when the model omitted one.
pub const NO_SUGGESTION: &str = "No specific suggestion available";

/// Suggested fix used when the reply could not be parsed at all.
pub const FORMAT_ERROR_SUGGESTION: &str =
    "Could not generate a suggestion (API response format error)";

/// Confidence used when the model omitted one or sent garbage.
pub const DEFAULT_CONFIDENCE: u8 = 50;

lazy_static! {
    /// First `{` through last `}`, across lines.
    static ref JSON_OBJECT_SPAN: Regex = Regex::new(r"(?s)(\{.*\})").unwrap();
}

/// Structured result of one remote analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub suggested_fix: String,
    pub details: String,
    /// Always within 0..=100.
    pub confidence: u8,
}

impl Diagnosis {
    /// Fixed diagnosis for replies that are not JSON.
    pub fn format_error() -> Self {
        Self {
            suggested_fix: FORMAT_ERROR_SUGGESTION.to_string(),
            details: String::new(),
            confidence: 0,
        }
    }

    /// Only diagnoses carrying a fix are cached and turned into issues.
    pub fn is_actionable(&self) -> bool {
        !self.suggested_fix.is_empty()
    }
}

/// Parse a completion body into a diagnosis, repairing what it can.
pub fn parse_response(body: &str) -> Diagnosis {
    let candidate = JSON_OBJECT_SPAN
        .captures(body)
        .and_then(|c| c.get(1))
        .map_or(body, |m| m.as_str());

    let data = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::error!(
                "RESPONSE_NOT_OBJECT kind={} body={:?}",
                json_kind(&other),
                body
            );
            return Diagnosis::format_error();
        }
        Err(e) => {
            log::error!("RESPONSE_PARSE_FAILED error={} body={:?}", e, body);
            return Diagnosis::format_error();
        }
    };

    let suggested_fix = data
        .get("suggested_fix")
        .map_or_else(|| NO_SUGGESTION.to_string(), value_to_string);

    let details = data.get("details").map(value_to_string).unwrap_or_default();

    let confidence = data
        .get("confidence")
        .and_then(value_to_int)
        .map_or(DEFAULT_CONFIDENCE, clamp_confidence);

    Diagnosis {
        suggested_fix,
        details,
        confidence,
    }
}

/// Clamp a raw confidence into 0..=100.
pub fn clamp_confidence(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_response() {
        let diagnosis = parse_response(
            r#"{"suggested_fix": "Check device power", "details": "Zigbee drop", "confidence": 80}"#,
        );
        assert_eq!(diagnosis.suggested_fix, "Check device power");
        assert_eq!(diagnosis.details, "Zigbee drop");
        assert_eq!(diagnosis.confidence, 80);
    }

    #[test]
    fn test_parse_embedded_in_prose() {
        let body = "Sure! Here is my analysis:\n{\n  \"suggested_fix\": \"Restart hue\",\n  \"confidence\": 70\n}\nHope this helps.";
        let diagnosis = parse_response(body);
        assert_eq!(diagnosis.suggested_fix, "Restart hue");
        assert_eq!(diagnosis.confidence, 70);
        assert_eq!(diagnosis.details, "");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let diagnosis = parse_response("{}");
        assert_eq!(diagnosis.suggested_fix, NO_SUGGESTION);
        assert_eq!(diagnosis.details, "");
        assert_eq!(diagnosis.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_confidence_clamping_and_coercion() {
        let cases = [
            (r#"{"suggested_fix": "x", "confidence": -5}"#, 0),
            (r#"{"suggested_fix": "x", "confidence": 150}"#, 100),
            (r#"{"suggested_fix": "x", "confidence": "abc"}"#, 50),
            (r#"{"suggested_fix": "x"}"#, 50),
            (r#"{"suggested_fix": "x", "confidence": "90"}"#, 90),
            (r#"{"suggested_fix": "x", "confidence": 66.6}"#, 66),
            (r#"{"suggested_fix": "x", "confidence": null}"#, 50),
        ];
        for (body, expected) in cases {
            assert_eq!(parse_response(body).confidence, expected, "body: {}", body);
        }
    }

    #[test]
    fn test_unparseable_body_falls_back() {
        assert_eq!(parse_response("not json at all"), Diagnosis::format_error());
        assert_eq!(parse_response("{broken: json"), Diagnosis::format_error());
        assert_eq!(parse_response("[1, 2, 3]"), Diagnosis::format_error());
        assert_eq!(Diagnosis::format_error().confidence, 0);
    }

    #[test]
    fn test_null_fix_is_not_actionable() {
        let diagnosis = parse_response(r#"{"suggested_fix": null, "confidence": 40}"#);
        assert!(!diagnosis.is_actionable());
        assert!(parse_response("{}").is_actionable());
    }
}
