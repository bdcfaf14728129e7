use serde_json::{Map, Value};

pub fn is_plain_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Recursively merges `override_value` into `base`; objects merge key-wise,
/// anything else is replaced unless the override is null.
pub fn merge_deep(base: &Value, override_value: &Value) -> Value {
    if !is_plain_object(base) || !is_plain_object(override_value) {
        if !override_value.is_null() {
            return override_value.clone();
        }
        return base.clone();
    }

    let mut result = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    if let Value::Object(override_map) = override_value {
        for (key, value) in override_map.iter() {
            let merged = match result.get(key) {
                Some(existing) if is_plain_object(existing) && is_plain_object(value) => {
                    merge_deep(existing, value)
                }
                _ => value.clone(),
            };
            result.insert(key.clone(), merged);
        }
    }

    Value::Object(result)
}
