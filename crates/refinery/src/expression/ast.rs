//! Parsed expression types.

use serde::{Deserialize, Serialize};

use crate::dataset::{Row, Value};

/// A single argument of a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    /// A quoted string.
    StringLiteral(String),
    /// An unquoted number.
    NumberLiteral(f64),
    /// Any other unquoted token. Resolves to a column when the row has one
    /// by that name, otherwise to the token text itself.
    ColumnReference(String),
}

impl Argument {
    /// Resolve the argument against a row.
    pub fn resolve(&self, row: &Row) -> Value {
        match self {
            Argument::StringLiteral(s) => Value::text(s.clone()),
            Argument::NumberLiteral(n) => Value::number(*n),
            Argument::ColumnReference(name) => row
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::text(name.clone())),
        }
    }

    /// Resolve without row context: column references become their token text.
    pub fn literal(&self) -> Value {
        match self {
            Argument::StringLiteral(s) | Argument::ColumnReference(s) => Value::text(s.clone()),
            Argument::NumberLiteral(n) => Value::number(*n),
        }
    }
}

/// A structured `FUNC(arg, ...)` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpression {
    /// Upper-cased function name.
    pub function_name: String,
    /// Arguments in source order.
    pub args: Vec<Argument>,
}

impl ParsedExpression {
    /// Split off the subject slot.
    ///
    /// Only an unquoted, non-numeric first token can be the subject, as in
    /// `LEFT(name, 3)`, and only when `is_subject` accepts it. Otherwise every
    /// argument is a parameter, so `RANK(desc)` keeps `desc`.
    pub fn split_subject(&self, is_subject: impl FnOnce(&str) -> bool) -> (Option<&str>, &[Argument]) {
        match self.args.split_first() {
            Some((Argument::ColumnReference(name), rest)) if is_subject(name) => {
                (Some(name.as_str()), rest)
            }
            _ => (None, &self.args),
        }
    }
}

/// The result of parsing any expression text. Parsing never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    /// A well-formed function call.
    Call(ParsedExpression),
    /// A lone identifier: a column reference, or a zero-argument call when no
    /// column has that name.
    Bare { name: String },
    /// Text that does not match the grammar. Evaluates to identity.
    Opaque { text: String },
}

impl Expression {
    /// The upper-cased function name, if this expression can name one.
    pub fn function_name(&self) -> Option<String> {
        match self {
            Expression::Call(call) => Some(call.function_name.clone()),
            Expression::Bare { name } => Some(name.to_uppercase()),
            Expression::Opaque { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_column_reference() {
        let mut row = Row::new();
        row.insert("city".to_string(), Value::text("Oslo"));

        let known = Argument::ColumnReference("city".to_string());
        let unknown = Argument::ColumnReference("country".to_string());

        assert_eq!(known.resolve(&row), Value::text("Oslo"));
        assert_eq!(unknown.resolve(&row), Value::text("country"));
    }

    #[test]
    fn test_subject_split() {
        let call = ParsedExpression {
            function_name: "LEFT".to_string(),
            args: vec![
                Argument::ColumnReference("name".to_string()),
                Argument::NumberLiteral(3.0),
            ],
        };
        let (subject, params) = call.split_subject(|_| true);
        assert_eq!(subject, Some("name"));
        assert_eq!(params, &[Argument::NumberLiteral(3.0)]);

        let (subject, params) = call.split_subject(|_| false);
        assert_eq!(subject, None);
        assert_eq!(params.len(), 2);

        let no_subject = ParsedExpression {
            function_name: "ROUND".to_string(),
            args: vec![Argument::NumberLiteral(2.0)],
        };
        assert_eq!(no_subject.split_subject(|_| true).0, None);
    }
}
