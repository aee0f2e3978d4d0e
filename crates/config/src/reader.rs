//! Violation collector and typed readers over raw values.
//!
//! Readers never fail fast: a mismatch records a violation and yields `None`,
//! and callers substitute the field default so sibling fields keep being
//! checked against a complete candidate.

use crate::path::ConfigPath;
use crate::schema::{ConfigEnum, Passthrough};
use crate::shape::{REQUIRED_MESSAGE, enum_message, expected_message};
use crate::violation::Violation;
use serde_json::{Map, Value};

/// Raw object type.
pub type RawObject = Map<String, Value>;

/// Look up a field, reading `null` as an omitted value.
pub fn field<'v>(object: &'v RawObject, key: &str) -> Option<&'v Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// Accumulates violations in discovery order.
#[derive(Debug, Default)]
pub struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, path: ConfigPath, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    /// Number of violations recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Consume the collector.
    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Record a shape mismatch.
    pub fn mismatch(&mut self, path: &ConfigPath, expected: &str, actual: &Value) {
        self.push(path.clone(), expected_message(expected, actual));
    }

    /// Record a missing required field.
    pub fn required(&mut self, path: &ConfigPath) {
        self.push(path.clone(), REQUIRED_MESSAGE);
    }

    /// Read a string.
    pub fn string(&mut self, path: &ConfigPath, value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            other => {
                self.mismatch(path, "string", other);
                None
            },
        }
    }

    /// Read a boolean.
    pub fn boolean(&mut self, path: &ConfigPath, value: &Value) -> Option<bool> {
        match value {
            Value::Bool(flag) => Some(*flag),
            other => {
                self.mismatch(path, "boolean", other);
                None
            },
        }
    }

    /// Borrow an object.
    pub fn object<'v>(&mut self, path: &ConfigPath, value: &'v Value) -> Option<&'v RawObject> {
        match value {
            Value::Object(object) => Some(object),
            other => {
                self.mismatch(path, "object", other);
                None
            },
        }
    }

    /// Copy an object as an opaque passthrough table.
    pub fn passthrough(&mut self, path: &ConfigPath, value: &Value) -> Option<Passthrough> {
        self.object(path, value)
            .map(|object| object.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Borrow an array.
    pub fn array<'v>(&mut self, path: &ConfigPath, value: &'v Value) -> Option<&'v [Value]> {
        match value {
            Value::Array(items) => Some(items),
            other => {
                self.mismatch(path, "array", other);
                None
            },
        }
    }

    /// Read an array of strings; every bad element is reported.
    pub fn string_list(&mut self, path: &ConfigPath, value: &Value) -> Option<Vec<String>> {
        let items = self.array(path, value)?;
        let before = self.len();
        let strings: Vec<String> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.string(&path.index(index), item))
            .collect();
        (self.len() == before).then_some(strings)
    }

    /// Read a string-to-string record; every bad value is reported.
    pub fn string_record(
        &mut self,
        path: &ConfigPath,
        value: &Value,
    ) -> Option<std::collections::BTreeMap<String, String>> {
        let object = self.object(path, value)?;
        let before = self.len();
        let record = object
            .iter()
            .filter_map(|(key, item)| {
                self.string(&path.key(key), item)
                    .map(|text| (key.clone(), text))
            })
            .collect();
        (self.len() == before).then_some(record)
    }

    /// Read one of a fixed set of string values.
    pub fn enumeration<E: ConfigEnum>(&mut self, path: &ConfigPath, value: &Value) -> Option<E> {
        let options = E::options();
        match value {
            Value::String(text) => E::parse(text).or_else(|| {
                self.push(path.clone(), enum_message(&options, text));
                None
            }),
            other => {
                let expected = options
                    .iter()
                    .map(|option| format!("'{option}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                self.mismatch(path, &expected, other);
                None
            },
        }
    }

    /// Read an integer within `[min, max]`.
    pub fn integer_in(
        &mut self,
        path: &ConfigPath,
        value: &Value,
        min: i64,
        max: i64,
    ) -> Option<i64> {
        let Value::Number(number) = value else {
            self.mismatch(path, "number", value);
            return None;
        };
        let integer = if let Some(integer) = number.as_i64() {
            integer
        } else if number.is_u64() {
            // Only values above `i64::MAX` fail `as_i64` while being unsigned.
            self.push(
                path.clone(),
                format!("Number must be less than or equal to {max}"),
            );
            return None;
        } else {
            match classify_float(number.as_f64().unwrap_or(f64::NAN), min, max) {
                FloatBound::Integral(integer) => integer,
                FloatBound::Fractional => {
                    self.push(path.clone(), "Expected integer, received float.");
                    return None;
                },
                FloatBound::Below => {
                    self.push(
                        path.clone(),
                        format!("Number must be greater than or equal to {min}"),
                    );
                    return None;
                },
                FloatBound::Above => {
                    self.push(
                        path.clone(),
                        format!("Number must be less than or equal to {max}"),
                    );
                    return None;
                },
            }
        };
        if integer < min {
            self.push(
                path.clone(),
                format!("Number must be greater than or equal to {min}"),
            );
            return None;
        }
        if integer > max {
            self.push(
                path.clone(),
                format!("Number must be less than or equal to {max}"),
            );
            return None;
        }
        Some(integer)
    }

    /// Read `key` from `object` with `read`, falling back to `default` when the
    /// field is absent or invalid.
    pub fn read_or<T>(
        &mut self,
        object: &RawObject,
        parent: &ConfigPath,
        key: &str,
        default: T,
        read: impl FnOnce(&mut Self, &ConfigPath, &Value) -> Option<T>,
    ) -> T {
        self.read_opt(object, parent, key, read).unwrap_or(default)
    }

    /// Read an optional field; absent and invalid both yield `None`.
    pub fn read_opt<T>(
        &mut self,
        object: &RawObject,
        parent: &ConfigPath,
        key: &str,
        read: impl FnOnce(&mut Self, &ConfigPath, &Value) -> Option<T>,
    ) -> Option<T> {
        let value = field(object, key)?;
        read(self, &parent.key(key), value)
    }

    /// Read a required field, reporting `Required` when it is absent.
    pub fn read_required<T>(
        &mut self,
        object: &RawObject,
        parent: &ConfigPath,
        key: &str,
        read: impl FnOnce(&mut Self, &ConfigPath, &Value) -> Option<T>,
    ) -> Option<T> {
        let path = parent.key(key);
        match field(object, key) {
            Some(value) => read(self, &path, value),
            None => {
                self.required(&path);
                None
            },
        }
    }
}

enum FloatBound {
    Integral(i64),
    Fractional,
    Below,
    Above,
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    reason = "the float is range-checked against the bounds before the integral conversion"
)]
fn classify_float(float: f64, min: i64, max: i64) -> FloatBound {
    if !float.is_finite() || float.fract() != 0.0 {
        FloatBound::Fractional
    } else if float < min as f64 {
        FloatBound::Below
    } else if float > max as f64 {
        FloatBound::Above
    } else {
        FloatBound::Integral(float as i64)
    }
}
