use serde_json::{Map, Value};

/// Check if the honeypot field is filled. Returns true if spam detected.
pub fn is_spam(data: &Map<String, Value>, honeypot_field: Option<&str>) -> bool {
    let Some(field) = honeypot_field.filter(|f| !f.is_empty()) else {
        return false;
    };

    match data.get(field) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Drop the (empty) honeypot field so it never reaches the backend.
pub fn strip(data: &mut Map<String, Value>, honeypot_field: Option<&str>) {
    if let Some(field) = honeypot_field {
        data.remove(field);
    }
}
