use serde::{Deserialize, Serialize};
use std::fmt;

/// A property value as carried by the model.
///
/// Deserializes from plain JSON scalars (`"2HR"`, `0.5`, `true`, `null`) so rule
/// packs can state expected values naturally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Number(f64),
    String(String),
    #[default]
    Absent,
}

impl PropertyValue {
    /// Absent or the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Absent => true,
            PropertyValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion used by range checks.
    ///
    /// Strings are trimmed and parsed; empty strings and absent values are not
    /// numbers. Booleans count as 1 and 0.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            PropertyValue::Number(n) => *n,
            PropertyValue::Boolean(b) => f64::from(u8::from(*b)),
            PropertyValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            PropertyValue::Absent => return None,
        };
        if n.is_nan() {
            None
        } else {
            Some(n)
        }
    }

    /// True for native booleans and the four textual encodings
    /// `"true"`, `"false"`, `".T."`, `".F."`.
    #[must_use]
    pub fn is_boolean_like(&self) -> bool {
        match self {
            PropertyValue::Boolean(_) => true,
            PropertyValue::String(s) => matches!(s.as_str(), "true" | "false" | ".T." | ".F."),
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.0}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Absent => Ok(()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Absent, Into::into)
    }
}
