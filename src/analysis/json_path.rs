//! JSON path resolution and value coercion.
//!
//! Resolves dot-notation paths like "choices.0.message.content" in
//! completion service replies, and coerces loosely typed model output into
//! the types a diagnosis needs.

use serde_json::Value;

/// Resolve a dot-notation path to a value in JSON.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use log_assistant_core::analysis::json_path::resolve_json_path;
///
/// let data = json!({"choices": [{"message": {"content": "{}"}}]});
/// let value = resolve_json_path(&data, "choices.0.message.content");
/// assert_eq!(value, Some(&json!("{}")));
/// ```
pub fn resolve_json_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for part in path.split('.') {
        match current {
            Value::Object(obj) => {
                current = obj.get(part)?;
            }
            Value::Array(arr) => {
                let index: usize = part.parse().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Convert a JSON value to its text form.
///
/// Strings are taken verbatim, `null` becomes empty, anything else is
/// rendered as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Convert a JSON value to an integer if possible.
///
/// Fractional numbers truncate toward zero, booleans count as 0/1, and
/// strings must hold a plain integer.
pub fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
