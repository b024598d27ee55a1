//! Convert record values to bind parameters.
//!
//! Every value is sent as text (or NULL) and the statement casts the
//! placeholder to the column's type, so one encoding covers integers, dates,
//! enums and free text alike.

use serde_json::Value;

pub fn bind_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

/// Escape LIKE metacharacters so the pattern is matched literally.
pub fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `%pattern%` with metacharacters escaped.
pub fn contains_pattern(pattern: &str) -> String {
    format!("%{}%", escape_like(pattern))
}
