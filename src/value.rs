//! Tri-state configuration values.
//!
//! The host hands configuration over as JSON. Every attribute is in exactly
//! one of three states: set to a concrete value, explicitly absent, or not
//! yet known because it depends on something the host has not computed.
//! Unknown values arrive encoded as `{"__unknown__": true}`.

use serde_json::{json, Value};

use crate::schema::Diagnostic;

/// Key of the object the host uses to encode a not-yet-known value.
pub const UNKNOWN_KEY: &str = "__unknown__";

/// A configuration value that may be set, null, or not yet known.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigValue<T> {
    /// The value is explicitly set.
    Known(T),
    /// The value is absent or explicitly null.
    #[default]
    Null,
    /// The value depends on something the host has not resolved yet.
    Unknown,
}

impl<T> ConfigValue<T> {
    /// Returns `true` if the value is not yet known.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns `true` if the value is absent or null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The concrete value, if one is set.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for ConfigValue<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

/// A type a [`ConfigValue`] can be decoded into from JSON.
pub trait FromConfigJson: Sized {
    /// Name of the expected JSON type, for error messages.
    const EXPECTED: &'static str;

    /// Convert a non-null, known JSON value.
    fn from_json(value: &Value) -> Option<Self>;
}

impl FromConfigJson for String {
    const EXPECTED: &'static str = "string";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromConfigJson for bool {
    const EXPECTED: &'static str = "bool";

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl<T: FromConfigJson> ConfigValue<T> {
    /// Decode attribute `name` from a configuration object.
    ///
    /// Missing keys decode to [`ConfigValue::Null`]. A value of the wrong
    /// type yields an error diagnostic scoped to the attribute.
    pub fn decode(config: &Value, name: &str) -> Result<Self, Diagnostic> {
        match config.get(name) {
            None | Some(Value::Null) => Ok(Self::Null),
            Some(v) if is_unknown(v) => Ok(Self::Unknown),
            Some(v) => T::from_json(v).map(Self::Known).ok_or_else(|| {
                Diagnostic::error(format!("Invalid type for attribute '{}'", name))
                    .with_detail(format!("Expected {}, got {}", T::EXPECTED, value_type_name(v)))
                    .with_attribute(name)
            }),
        }
    }
}

/// Whether a JSON value is the host's encoding of an unknown value.
pub fn is_unknown(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.len() == 1 && obj.get(UNKNOWN_KEY) == Some(&Value::Bool(true)))
}

/// The JSON encoding of an unknown value.
pub fn unknown() -> Value {
    json!({ UNKNOWN_KEY: true })
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
