//! Query-string value coercion.

use crate::store::Value;

/// Interpret a raw parameter as an integer, then a float, else a string
pub fn coerce(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Str(raw.to_string())
}
