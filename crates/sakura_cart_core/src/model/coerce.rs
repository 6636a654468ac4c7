//! Lenient numeric/string coercion for untrusted JSON input.
//!
//! Persisted carts and forwarded orders come from browser code, so numbers may
//! arrive as strings, booleans or nulls. These helpers follow the usual
//! JavaScript `Number(value)` conversion and return `NaN` where it would.

use serde_json::Value;

/// Converts a JSON value to a number the way `Number(value)` does.
pub fn js_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(flag)) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => parse_numeric_text(text),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// `Number(value) || fallback`: zero and NaN fall back.
pub fn number_or(value: Option<&Value>, fallback: f64) -> f64 {
    let number = js_number(value);
    if number.is_nan() || number == 0.0 {
        fallback
    } else {
        number
    }
}

/// Returns the value when it is a JSON string, otherwise empty.
pub fn string_or_empty(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Coerces a unit price: NaN, infinities and negatives become 0.
pub fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // Rust accepts "inf"/"nan" spellings that JS rejects.
    if trimmed
        .chars()
        .any(|ch| ch.is_ascii_alphabetic() && !matches!(ch, 'e' | 'E'))
    {
        return match trimmed {
            "Infinity" | "+Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ => f64::NAN,
        };
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
