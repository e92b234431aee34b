//! Field-by-field merging of config tiers.
//!
//! Higher tiers override lower ones key by key; arrays and scalars are
//! replaced whole.

use serde_json::Value;

/// Merge `overlay` onto `base`. Objects merge recursively; a null overlay
/// keeps the base value, anything else replaces it.
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskboard::config::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8000, "host": "127.0.0.1" },
///     "archive": { "window_hours": 8 }
/// });
/// let overlay = json!({ "server": { "port": 9000 } });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result["server"]["port"], 9000);
/// assert_eq!(result["server"]["host"], "127.0.0.1");
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(layer)) => {
            for (key, value) in layer {
                let value = match merged.remove(&key) {
                    Some(lower) => deep_merge(lower, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers in order, lowest first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
