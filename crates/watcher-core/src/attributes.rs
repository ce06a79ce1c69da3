use serde_json::{Map, Value};

/// Normalizes a variant attribute map (e.g. `{"Color": " Red ", "size": "M"}`)
/// so that two variants with the same attributes in a different key order,
/// casing, or with incidental whitespace compare and hash equal. Keys are
/// lowercased and sorted; string values are trimmed. This is the shape
/// stored in the `product_variants.attributes` jsonb column and relied on by
/// its `UNIQUE (product_id, attributes)` constraint.
pub fn normalize_attributes(raw: &Map<String, Value>) -> Value {
    let mut entries: Vec<(String, Value)> = raw
        .iter()
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), normalize_value(value)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut normalized = Map::new();
    for (key, value) in entries {
        normalized.insert(key, value);
    }
    Value::Object(normalized)
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other.clone(),
    }
}
