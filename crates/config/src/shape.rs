//! Value shapes and the structural message templates built from them.

use serde_json::Value;

/// Shape name of a raw value, as used in `received <shape>` messages.
#[must_use]
pub const fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truthiness of a raw value (`false`, `null`, `0`, `NaN` and `""` are falsy).
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `Expected <expected>, received <actual>.`
#[must_use]
pub fn expected_message(expected: &str, actual: &Value) -> String {
    format!("Expected {expected}, received {}.", shape_of(actual))
}

/// Message for a missing required field.
pub const REQUIRED_MESSAGE: &str = "Required";

/// Message for a string that does not parse as a URL.
pub const INVALID_URL_MESSAGE: &str = "Invalid url";

/// Message for an empty array where at least one element is required.
pub const NON_EMPTY_ARRAY_MESSAGE: &str = "Array must contain at least 1 element(s)";

/// `Invalid enum value. Expected 'a' | 'b', received 'c'`
#[must_use]
pub fn enum_message(options: &[&str], received: &str) -> String {
    let expected = options
        .iter()
        .map(|option| format!("'{option}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("Invalid enum value. Expected {expected}, received '{received}'")
}

/// `Expected a or b, received <actual>.` for two-armed unions.
#[must_use]
pub fn union_message(left: &str, right: &str, actual: &Value) -> String {
    expected_message(&format!("{left} or {right}"), actual)
}
