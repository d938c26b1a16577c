use serde_json::Value;

/// Masks personal and secret fields of a JSON payload before it is logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "id_number"
            | "date_of_birth"
            | "phone_number"
            | "physical_address"
            | "postal_address"
            | "proof_reference"
            | "password"
            | "secret"
            | "token"
            | "authorization"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > 8 => {
            let chars: Vec<char> = s.chars().collect();
            let start: String = chars[..2].iter().collect();
            let end: String = chars[chars.len() - 2..].iter().collect();
            Value::String(format!("{}****{}", start, end))
        }
        Value::Null => Value::Null,
        _ => Value::String("****".to_string()),
    }
}
