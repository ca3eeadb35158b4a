use serde_json::Value;

/// Replacement written over redacted values
const MASK: &str = "*****";

/// Field names whose string values are masked before a record leaves the process
const SENSITIVE_KEYS: [&str; 3] = ["password", "token", "email"];

/// Serialize a structured record with sensitive fields masked
///
/// Walks the value tree and replaces the value of any `password`, `token` or
/// `email` key with `*****`, at any nesting depth. Only string values are
/// masked; a numeric or object value under a sensitive key passes through
/// unchanged. That limitation is part of the contract (see the tests).
///
/// Pure and infallible: a serializer error degrades to `{}` rather than
/// propagating into the request path.
pub fn sanitize(data: &Value) -> String {
    let mut masked = data.clone();
    mask_in_place(&mut masked);
    serde_json::to_string(&masked).unwrap_or_else(|_| "{}".to_string())
}

fn mask_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if SENSITIVE_KEYS.contains(&key.as_str()) && child.is_string() {
                    *child = Value::String(MASK.to_string());
                } else {
                    mask_in_place(child);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                mask_in_place(item);
            }
        }
        _ => {}
    }
}
