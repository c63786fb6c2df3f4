//! Scanner for the `FUNC(arg, ...)` mini-language.
//!
//! ```text
//! Expr := Identifier | Identifier "(" [Arg ("," Arg)*] ")"
//! Arg  := QuotedString | Number | Identifier
//! ```
//!
//! The parser is total. Anything outside the grammar comes back as
//! [`Expression::Opaque`] rather than an error.

use super::ast::{Argument, Expression, ParsedExpression};

/// Parse expression text.
pub fn parse(text: &str) -> Expression {
    let parsed = try_parse(text);
    if parsed.is_none() {
        tracing::debug!(expression = text, "expression does not match call grammar");
    }
    parsed.unwrap_or_else(|| Expression::Opaque {
        text: text.to_string(),
    })
}

/// The leading identifier of an expression, upper-cased.
///
/// This is the name the one-function-per-column rule compares on. It is
/// extracted even when the rest of the expression is malformed.
pub fn leading_function_name(text: &str) -> Option<String> {
    let (ident, _) = split_identifier(text.trim_start())?;
    Some(ident.to_uppercase())
}

fn try_parse(text: &str) -> Option<Expression> {
    let trimmed = text.trim();
    let (ident, rest) = split_identifier(trimmed)?;
    let rest = rest.trim_start();

    if rest.is_empty() {
        return Some(Expression::Bare {
            name: ident.to_string(),
        });
    }

    let inner = rest.strip_prefix('(')?;
    let (args, trailing) = scan_arguments(inner)?;
    if !trailing.trim().is_empty() {
        return None;
    }

    Some(Expression::Call(ParsedExpression {
        function_name: ident.to_uppercase(),
        args,
    }))
}

/// Split a leading identifier (`[A-Za-z_][A-Za-z0-9_]*`) off the text.
fn split_identifier(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }

    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    Some(text.split_at(end))
}

/// Scan the argument list after the opening parenthesis.
///
/// Returns the arguments and whatever follows the closing parenthesis, or
/// `None` if the list is malformed: unterminated quotes, a missing `)`,
/// empty slots, text after a closing quote, or a nested `(`.
fn scan_arguments(inner: &str) -> Option<(Vec<Argument>, &str)> {
    let mut args = Vec::new();
    let mut token = String::new();
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut saw_separator = false;

    for (i, ch) in inner.char_indices() {
        if let Some(q) = quote {
            if escaped {
                token.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            } else {
                token.push(ch);
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                if quoted || !token.trim().is_empty() {
                    return None;
                }
                token.clear();
                quoted = true;
                quote = Some(ch);
            }
            ',' => {
                args.push(finish_argument(&token, quoted)?);
                token.clear();
                quoted = false;
                saw_separator = true;
            }
            ')' => {
                let rest = &inner[i + ch.len_utf8()..];
                if quoted || !token.trim().is_empty() {
                    args.push(finish_argument(&token, quoted)?);
                } else if saw_separator {
                    // Trailing comma: `F(a,)`
                    return None;
                }
                return Some((args, rest));
            }
            '(' => return None,
            c if quoted => {
                if !c.is_whitespace() {
                    return None;
                }
            }
            c => token.push(c),
        }
    }

    None
}

fn finish_argument(token: &str, quoted: bool) -> Option<Argument> {
    if quoted {
        return Some(Argument::StringLiteral(token.to_string()));
    }

    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    match parse_number(trimmed) {
        Some(n) => Some(Argument::NumberLiteral(n)),
        None => Some(Argument::ColumnReference(trimmed.to_string())),
    }
}

/// Plain decimal literals only; `inf`, `NaN` and friends stay tokens.
fn parse_number(token: &str) -> Option<f64> {
    let first = token.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}
