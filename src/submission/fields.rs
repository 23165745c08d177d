use serde_json::{Map, Value};

use crate::models::FormType;

/// Check the fields a form type cannot do without. Returns every problem
/// found rather than stopping at the first.
pub fn validate(form_type: FormType, data: &Map<String, Value>) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for &name in form_type.required_fields() {
        match data.get(name) {
            None | Some(Value::Null) => errors.push(format!("Missing required field: {name}")),
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.push(format!("Required field is empty: {name}"));
            }
            Some(Value::String(s)) if name == "email" && !looks_like_email(s) => {
                errors.push(format!("Invalid email format: {name}"));
            }
            _ => {}
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn looks_like_email(s: &str) -> bool {
    match s.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
