use remap_types::{CastTo, Value};

/// Applies a rule's cast. Total: bad input never errors.
pub fn cast_value(value: &Value, cast: CastTo) -> Value {
    match cast {
        CastTo::Boolean => {
            let text = value.text_form();
            Value::Bool(text.to_lowercase() == "true" || text == "1")
        }
        CastTo::Number => Value::Number(value.to_number()),
    }
}
