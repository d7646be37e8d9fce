//! JSON-safe scalar values.
//!
//! Every value that crosses the bus or lands in a CSV artifact is a `Cell`.
//! The type is the sanitization boundary: non-finite floats serialize as
//! null, and inbound compound values (arrays, objects) are coerced to their
//! compact JSON string rather than rejected.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A single JSON-safe scalar: string, number, boolean or null.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Cell {
    /// Whether this cell carries no usable value.
    ///
    /// Upstream emits both JSON null and the empty string for absent
    /// fields, so both count as missing for fill and drop rules.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Str(s) => s.is_empty(),
            Cell::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if one exists.
    ///
    /// Strings are parsed leniently since quantities round-trip through
    /// CSV artifacts as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Str(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String view of the cell, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Replace non-finite floats with null. All other values pass through.
    pub fn sanitized(self) -> Cell {
        match self {
            Cell::Float(f) if !f.is_finite() => Cell::Null,
            other => other,
        }
    }

    /// Coerce an identifier cell to its string form.
    ///
    /// Integral floats render without a trailing `.0` so numeric ids never
    /// drift through missing-value coercion (`7` stays `"7"`).
    pub fn coerce_to_string(self) -> Cell {
        match self {
            Cell::Int(i) => Cell::Str(i.to_string()),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9e15 => {
                Cell::Str(format!("{}", f as i64))
            }
            Cell::Float(f) if f.is_finite() => Cell::Str(f.to_string()),
            Cell::Float(_) => Cell::Null,
            Cell::Bool(b) => Cell::Str(b.to_string()),
            other => other,
        }
    }

    /// Convert a JSON value to a cell.
    ///
    /// Arrays and objects have no scalar representation; they fall back to
    /// their compact JSON string so information is preserved over failing.
    pub fn from_json(value: serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(b) => Cell::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Cell::Int(i)
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() => Cell::Float(f),
                        _ => Cell::Null,
                    }
                }
            }
            serde_json::Value::String(s) => Cell::Str(s),
            compound => Cell::Str(compound.to_string()),
        }
    }

    /// Render the cell for a CSV field. Null becomes the empty field.
    pub fn to_csv_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.is_finite() => f.to_string(),
            Cell::Float(_) => String::new(),
            Cell::Str(s) => s.clone(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_unit(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            // NaN and infinities must never leak into a serialized record.
            Cell::Float(_) => serializer.serialize_unit(),
            Cell::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Cell::from_json(value))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Str(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Str(s)
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}
