//! Cell values and rows.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single row: column name to value, in column order.
pub type Row = IndexMap<String, Value>;

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl Value {
    /// Create a numeric value, folding negative zero into zero.
    pub fn number(n: f64) -> Self {
        if n == 0.0 {
            Value::Number(0.0)
        } else {
            Value::Number(n)
        }
    }

    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Interpret a raw cell from a delimited file. Empty cells become null.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for null and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Best-effort numeric coercion.
    ///
    /// Numbers pass through, booleans become 1/0, and text is trimmed with
    /// thousands separators removed before parsing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) | Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }

    /// Render the value as text, the way it is displayed and exported.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_integral_numbers() {
        assert_eq!(Value::number(5.0).to_text(), "5");
        assert_eq!(Value::number(3.5).to_text(), "3.5");
        assert_eq!(Value::number(-0.0).to_text(), "0");
        assert_eq!(Value::Null.to_text(), "");
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::text(" 42 ").as_number(), Some(42.0));
        assert_eq!(Value::text("1,234.5").as_number(), Some(1234.5));
        assert_eq!(Value::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::text("abc").as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::text("   ").is_blank());
        assert!(!Value::text("x").is_blank());
        assert!(!Value::number(0.0).is_blank());
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 1.5, "a"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(1.5),
                Value::text("a")
            ]
        );
    }
}
