//! Column type inference.

use serde::{Deserialize, Serialize};

use crate::functions::parse_date;

use super::value::{format_number, Value};

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers (no decimal point).
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values (true/false).
    Boolean,
    /// Date values.
    Date,
    /// Text/string values.
    String,
    /// No non-null values to infer from.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Infer a column type from its values.
    ///
    /// Nulls and blank text are ignored. A column is only given a narrower
    /// type when every remaining value fits it.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut seen = false;
        let mut all_bool = true;
        let mut all_int = true;
        let mut all_number = true;
        let mut all_date = true;

        for value in values {
            if value.is_blank() {
                continue;
            }
            seen = true;
            match value {
                Value::Bool(_) => {
                    all_int = false;
                    all_number = false;
                    all_date = false;
                }
                Value::Number(n) => {
                    all_bool = false;
                    all_date = false;
                    if n.fract() != 0.0 {
                        all_int = false;
                    }
                }
                Value::Text(s) => {
                    let trimmed = s.trim();
                    if !is_bool_literal(trimmed) {
                        all_bool = false;
                    }
                    if trimmed.parse::<i64>().is_err() {
                        all_int = false;
                    }
                    if trimmed.parse::<f64>().is_err() {
                        all_number = false;
                    }
                    if all_date && parse_date(trimmed).is_none() {
                        all_date = false;
                    }
                }
                Value::Null => {}
            }
        }

        if !seen {
            ColumnType::Unknown
        } else if all_bool {
            ColumnType::Boolean
        } else if all_int {
            ColumnType::Integer
        } else if all_number {
            ColumnType::Float
        } else if all_date {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }

    /// Convert a raw text cell into a typed value for this column type.
    ///
    /// Numbers are converted only when they print back to the same text, so
    /// `00501`, `1.50` and integers beyond 2^53 stay text.
    pub fn coerce(&self, value: Value) -> Value {
        let Value::Text(ref s) = value else {
            return value;
        };
        let trimmed = s.trim();
        match self {
            ColumnType::Integer | ColumnType::Float => match trimmed.parse::<f64>() {
                Ok(n) if format_number(n) == trimmed => Value::number(n),
                _ => value,
            },
            ColumnType::Boolean => match trimmed.to_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => value,
            },
            ColumnType::Date | ColumnType::String | ColumnType::Unknown => value,
        }
    }
}

fn is_bool_literal(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
}

/// Name and inferred type of a dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Inferred data type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnInfo {
    /// Create column info.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from_raw(s)).collect()
    }

    #[test]
    fn test_infer_numeric() {
        assert_eq!(ColumnType::infer(&texts(&["1", "2", ""])), ColumnType::Integer);
        assert_eq!(ColumnType::infer(&texts(&["1", "2.5"])), ColumnType::Float);
    }

    #[test]
    fn test_infer_other_types() {
        assert_eq!(ColumnType::infer(&texts(&["true", "FALSE"])), ColumnType::Boolean);
        assert_eq!(
            ColumnType::infer(&texts(&["2024-01-15", "03/04/2023"])),
            ColumnType::Date
        );
        assert_eq!(ColumnType::infer(&texts(&["a", "1"])), ColumnType::String);
        assert_eq!(ColumnType::infer(&texts(&["", ""])), ColumnType::Unknown);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(ColumnType::Integer.coerce(Value::text("10")), Value::number(10.0));
        assert_eq!(ColumnType::Float.coerce(Value::text("2.5")), Value::number(2.5));
        assert_eq!(ColumnType::Integer.coerce(Value::text("00501")), Value::text("00501"));
        assert_eq!(ColumnType::Float.coerce(Value::text("1.50")), Value::text("1.50"));
        assert_eq!(
            ColumnType::Integer.coerce(Value::text("9007199254740993")),
            Value::text("9007199254740993")
        );
        assert_eq!(ColumnType::Boolean.coerce(Value::text("True")), Value::Bool(true));
        assert_eq!(ColumnType::String.coerce(Value::text("10")), Value::text("10"));
        assert_eq!(ColumnType::Integer.coerce(Value::Null), Value::Null);
    }
}
