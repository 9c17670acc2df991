//! Tolerant decoding of model output.

use serde::de::DeserializeOwned;

/// Strip a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse JSON leniently, handling the shapes models commonly return.
///
/// Accepts the expected type directly, an object wrapping a single array
/// (`{"tasks": [...]}` for a list), or a bare object where a one-element
/// list is expected. Code fences are stripped first.
pub fn parse_json_lenient<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let raw = strip_code_fences(raw);
    let direct_err = match serde_json::from_str::<T>(raw) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    if let Ok(obj) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        for value in obj.values() {
            if value.is_array() {
                if let Ok(v) = serde_json::from_value::<T>(value.clone()) {
                    return Ok(v);
                }
            }
        }
        let wrapped = serde_json::Value::Array(vec![serde_json::Value::Object(obj)]);
        if let Ok(v) = serde_json::from_value::<T>(wrapped) {
            return Ok(v);
        }
    }
    Err(direct_err)
}
