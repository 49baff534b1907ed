//! Utility functions for request bodies

use serde_json::Value;

/// Wire keys whose values must never reach logs or error messages
const SECRET_KEYS: &[&str] = &["pullSecret", "clientSecret"];

const REDACTED: &str = "<redacted>";

/// Copy of `value` with every secret field replaced by a placeholder
pub fn redact_secrets(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if SECRET_KEYS.contains(&k.as_str()) && !v.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_secrets(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_secrets).collect()),
        other => other.clone(),
    }
}
