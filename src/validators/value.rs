//! Typed configuration values.
//!
//! Settings and rule values arrive from JSON or YAML documents in several
//! shapes. [`ConfigValue`] keeps the origin visible as an explicit tag so that
//! every conversion is a `match` arm instead of a runtime type check.

use serde::Serialize;
use serde_json::Value;

/// The kind tag of a [`ConfigValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Absent or explicit `null`.
    Null,
    /// `true` / `false`.
    Bool,
    /// Native number.
    Number,
    /// Text.
    String,
    /// Array or object element kept as parsed.
    Raw,
    /// Anything the parsers could not classify.
    Unknown,
}

impl ValueKind {
    /// Every kind, for validators that accept anything.
    pub const ALL: &'static [Self] = &[
        Self::Null,
        Self::Bool,
        Self::Number,
        Self::String,
        Self::Raw,
        Self::Unknown,
    ];
}

/// A configuration value as seen by validators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Absent key or explicit `null`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar, kept in its parsed representation.
    Number(serde_json::Number),
    /// String scalar.
    String(String),
    /// Array or object. Text is produced on demand.
    Raw(Value),
    /// Value of an unrecognized kind, kept as text.
    Unknown(String),
}

impl ConfigValue {
    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Raw(_) => ValueKind::Raw,
            Self::Unknown(_) => ValueKind::Unknown,
        }
    }

    /// Returns `true` for [`ConfigValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts a parsed JSON value, keeping scalars native and containers raw.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Raw(value.clone()),
        }
    }

    /// Textual form. Strings are returned without quotes, containers as
    /// compact JSON. `None` for null.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) | Self::Unknown(s) => Some(s.clone()),
            Self::Raw(Value::String(s)) => Some(s.clone()),
            Self::Raw(v) => Some(v.to_string()),
        }
    }

    /// Numeric interpretation, independent of where the value came from.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Null | Self::Bool(_) => None,
            Self::Number(n) => n.as_f64(),
            Self::String(s) | Self::Unknown(s) => parse_number(s),
            Self::Raw(Value::Number(n)) => n.as_f64(),
            Self::Raw(Value::String(s)) => parse_number(s),
            Self::Raw(_) => None,
        }
    }

    /// Interprets the value as a 32-bit signed integer.
    #[must_use]
    pub fn to_i32(&self) -> Option<i32> {
        match self {
            Self::Number(n) | Self::Raw(Value::Number(n)) => number_to_i32(n),
            Self::String(s) | Self::Unknown(s) | Self::Raw(Value::String(s)) => {
                s.trim().parse::<i32>().ok()
            }
            _ => None,
        }
    }

    /// Interprets the value as a list of strings.
    ///
    /// Arrays map element-wise, strings are split on commas, other scalars
    /// become a one-element list.
    #[must_use]
    pub fn to_string_array(&self) -> Option<Vec<String>> {
        match self {
            Self::Null => None,
            Self::Raw(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Self::Raw(Value::Object(_)) => None,
            Self::String(s) | Self::Unknown(s) | Self::Raw(Value::String(s)) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            other => other.to_text().map(|text| vec![text]),
        }
    }

    /// Length used by `min_len` / `max_len`.
    ///
    /// Characters for text, elements for arrays, members for objects. Null
    /// has length zero.
    #[must_use]
    pub fn length(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Raw(Value::Array(items)) => items.len(),
            Self::Raw(Value::Object(map)) => map.len(),
            other => other.to_text().map_or(0, |text| text.chars().count()),
        }
    }

    /// Returns `true` for raw arrays and objects.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Raw(Value::Array(_) | Value::Object(_)))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            container => Self::Raw(container),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_i32(n: &serde_json::Number) -> Option<i32> {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).ok();
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX))
        .map(|f| f as i32)
}
